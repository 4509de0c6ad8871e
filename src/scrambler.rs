//! Additive data scrambler (x^7 + x^4 + 1)
//!
//! The same XOR operation scrambles and descrambles. A zero initial state
//! produces an all-zero sequence, which is how the SIGNAL field is sent
//! "unscrambled" through the same code path as the data field.
//!
//! The sequence generated from the all-ones state also supplies the 127-long
//! pilot polarity pattern.

use bitvec::prelude::*;

use crate::util::Bits;

/// Number of zero tail bits that terminate the convolutional encoder
pub const TAIL_BITS: usize = 6;

/// Scrambler seed used for every data field
pub const DATA_SEED: u8 = 0x5D;

/// Scrambler seed used for the SIGNAL field
pub const HEADER_SEED: u8 = 0;

/// Period of the scrambler sequence
pub const PERIOD: usize = 127;

/// How the input is extended before scrambling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Scramble exactly the bits given (receive side)
    None,
    /// Append the encoder tail and zero-pad to a multiple of the given number
    /// of data bits per OFDM symbol. The tail is zeroed again after scrambling
    /// so the trellis terminates in state 0.
    Symbol(usize),
}

/// 7-bit scrambler LFSR
#[derive(Debug, Clone)]
pub struct Lfsr {
    state: u8,
}

impl Lfsr {
    pub fn new(state: u8) -> Self {
        Self { state: state & 0x7F }
    }
}

impl Iterator for Lfsr {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        let feedback = ((self.state >> 6) ^ (self.state >> 3)) & 1;
        self.state = ((self.state << 1) & 0x7E) | feedback;
        Some(feedback == 1)
    }
}

/// Scramble (or descramble) a bit stream starting from `state`
pub fn scramble(bits: &BitSlice<u8, Lsb0>, padding: Padding, state: u8) -> Bits {
    let mut padded: Bits = bits.to_bitvec();
    if let Padding::Symbol(nbps) = padding {
        padded.resize(padded.len() + TAIL_BITS, false);
        let remainder = padded.len() % nbps;
        if remainder != 0 {
            padded.resize(padded.len() + nbps - remainder, false);
        }
    }

    let mut scrambled: Bits = padded
        .iter()
        .by_vals()
        .zip(Lfsr::new(state))
        .map(|(bit, key)| bit ^ key)
        .collect();

    if let Padding::Symbol(_) = padding {
        scrambled[bits.len()..bits.len() + TAIL_BITS].fill(false);
    }
    scrambled
}

/// Pilot polarity pattern, +1/-1, one entry per OFDM symbol (cyclic)
pub fn pilot_polarity() -> Vec<f64> {
    Lfsr::new(0x7F)
        .take(PERIOD)
        .map(|bit| if bit { -1.0 } else { 1.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::bits_from_octets;

    #[test]
    fn test_scramble_is_involution() {
        let data = bits_from_octets(b"scrambler round trip");
        let scrambled = scramble(&data, Padding::None, DATA_SEED);
        assert_ne!(scrambled, data);
        assert_eq!(scramble(&scrambled, Padding::None, DATA_SEED), data);
    }

    #[test]
    fn test_zero_state_is_identity() {
        let data = bits_from_octets(&[0xA5, 0x3C]);
        assert_eq!(scramble(&data, Padding::None, HEADER_SEED), data);
    }

    #[test]
    fn test_sequence_period() {
        let seq: Vec<bool> = Lfsr::new(DATA_SEED).take(2 * PERIOD).collect();
        assert_eq!(seq[..PERIOD], seq[PERIOD..]);
        // Maximal-length: 64 ones and 63 zeros per period
        assert_eq!(seq[..PERIOD].iter().filter(|b| **b).count(), 64);
    }

    #[test]
    fn test_symbol_padding_zeroes_tail() {
        let data = bits_from_octets(&[0xFF; 3]);
        let scrambled = scramble(&data, Padding::Symbol(24), DATA_SEED);
        // 24 data bits + 6 tail -> padded to 48
        assert_eq!(scrambled.len(), 48);
        assert!(scrambled[24..30].not_any());
    }

    #[test]
    fn test_pilot_polarity_prefix() {
        let polarity = pilot_polarity();
        assert_eq!(polarity.len(), PERIOD);
        assert_eq!(polarity[..8], [1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0, 1.0]);
    }
}
