//! Block interleaver
//!
//! Two-step permutation over one OFDM symbol's worth of coded bits: the first
//! step spreads adjacent coded bits onto non-adjacent subcarriers, the second
//! alternates them between more and less significant constellation bits.
//! The permutation is generic over the element type so the receive side runs
//! the inverse directly over LLRs.

use bitvec::prelude::*;

use crate::util::Bits;

/// Interleaver for one `(coded bits per symbol, bits per subcarrier)` pair
#[derive(Debug, Clone)]
pub struct Interleaver {
    /// `forward[k]` is the output position of input bit `k`
    forward: Vec<usize>,
    /// `inverse[j]` is the input position that lands on output `j`
    inverse: Vec<usize>,
}

impl Interleaver {
    pub fn new(ncbps: usize, nbpsc: usize) -> Self {
        assert!(ncbps % 16 == 0, "block size must be a multiple of 16");
        let s = (nbpsc / 2).max(1);
        let forward: Vec<usize> = (0..ncbps)
            .map(|k| {
                let i = (ncbps / 16) * (k % 16) + k / 16;
                s * (i / s) + (i + ncbps - (16 * i / ncbps)) % s
            })
            .collect();

        let mut inverse = vec![0; ncbps];
        for (k, &j) in forward.iter().enumerate() {
            inverse[j] = k;
        }
        Self { forward, inverse }
    }

    pub fn block_size(&self) -> usize {
        self.forward.len()
    }

    /// Permute `input` block by block; `reverse` selects the de-interleaver
    ///
    /// A trailing partial block is dropped.
    pub fn apply<T: Copy>(&self, input: &[T], reverse: bool) -> Vec<T> {
        let sources = if reverse { &self.forward } else { &self.inverse };
        input
            .chunks_exact(self.block_size())
            .flat_map(|block| sources.iter().map(move |&src| block[src]))
            .collect()
    }

    /// Same as [`Interleaver::apply`] for a bit stream
    pub fn apply_bits(&self, input: &BitSlice<u8, Lsb0>, reverse: bool) -> Bits {
        let sources = if reverse { &self.forward } else { &self.inverse };
        input
            .chunks_exact(self.block_size())
            .flat_map(|block| sources.iter().map(move |&src| block[src]))
            .collect()
    }
}
