//! Convolutional error correction
//!
//! Rate-1/2, constraint length 7 code with generators 133 and 171 (octal).
//! Higher code rates are derived by puncturing the mother code; the receiver
//! re-inserts neutral LLRs at the punctured positions and runs a soft-decision
//! Viterbi decoder over the full-rate stream.

mod encode;
mod puncture;
mod viterbi;

pub use puncture::PuncturingMask;

use crate::util::{reverse_bits, Bits};
use bitvec::prelude::*;

/// Convolutional code description shared by encoder and decoder
#[derive(Debug, Clone)]
pub struct ConvolutionalCode {
    /// Constraint length K (memory + 1)
    pub constraint_length: usize,
    /// Generator polynomials, first output first
    pub generators: [u32; 2],
}

impl Default for ConvolutionalCode {
    fn default() -> Self {
        Self {
            constraint_length: 7,
            generators: [0o133, 0o171],
        }
    }
}

impl ConvolutionalCode {
    /// Number of trellis states (2^(K-1))
    pub fn num_states(&self) -> usize {
        1 << (self.constraint_length - 1)
    }

    /// Encode `bits` at rate 1/2
    ///
    /// The encoder starts in state 0 and is not flushed; terminate the
    /// trellis by ending the input with K-1 zeros.
    pub fn encode(&self, bits: &BitSlice<u8, Lsb0>) -> Bits {
        encode::encode(self, bits)
    }

    /// Soft-decision decode `n_bits` input bits from rate-1/2 LLRs
    ///
    /// Positive LLRs favour a 1; zero is an erasure.
    pub fn decode(&self, llr: &[f64], n_bits: usize) -> Bits {
        viterbi::decode(self, llr, n_bits)
    }

    /// Both encoder outputs for a full K-bit register (newest bit in the LSB)
    ///
    /// Generator polynomials are written with the current input as the most
    /// significant tap, so they are mirrored onto the register.
    pub(crate) fn outputs(&self, register: usize) -> [bool; 2] {
        let register = register as u32;
        let taps = |g: u32| reverse_bits(g, self.constraint_length);
        [
            (register & taps(self.generators[0])).count_ones() & 1 == 1,
            (register & taps(self.generators[1])).count_ones() & 1 == 1,
        ]
    }
}
