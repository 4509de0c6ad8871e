//! Puncturing of the rate-1/2 mother code

use bitvec::prelude::*;

use crate::util::Bits;

/// Periodic keep/drop pattern over the rate-1/2 coded stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PuncturingMask {
    pattern: Vec<bool>,
}

impl PuncturingMask {
    /// Mask for a code rate `numerator / denominator`
    ///
    /// Supported rates are 1/2, 2/3, 3/4, 5/6 and 7/8.
    pub fn new(numerator: usize, denominator: usize) -> Self {
        let pattern: &[u8] = match (numerator, denominator) {
            (1, 2) => &[1, 1],
            (2, 3) => &[1, 1, 1, 0],
            (3, 4) => &[1, 1, 1, 0, 0, 1],
            (5, 6) => &[1, 1, 1, 0, 0, 1, 1, 0, 0, 1],
            (7, 8) => &[1, 1, 1, 0, 1, 0, 1, 0, 0, 1, 1, 0, 0, 1],
            _ => panic!("unsupported code rate {}/{}", numerator, denominator),
        };
        Self {
            pattern: pattern.iter().map(|&keep| keep == 1).collect(),
        }
    }

    /// Pattern period in mother-code bits
    pub fn period(&self) -> usize {
        self.pattern.len()
    }

    /// Bits kept per period
    pub fn kept(&self) -> usize {
        self.pattern.iter().filter(|&&keep| keep).count()
    }

    /// Drop the masked-out positions of a rate-1/2 coded stream
    pub fn puncture(&self, coded: &BitSlice<u8, Lsb0>) -> Bits {
        coded
            .iter()
            .by_vals()
            .zip(self.pattern.iter().cycle())
            .filter_map(|(bit, &keep)| keep.then_some(bit))
            .collect()
    }

    /// Re-insert zero LLRs at the punctured positions
    ///
    /// The output always covers whole pattern periods: `ceil(N / kept)`
    /// periods for `N` input values, zero-filled past the end of the input.
    pub fn depuncture(&self, llr: &[f64]) -> Vec<f64> {
        let periods = (llr.len() + self.kept() - 1) / self.kept();
        let mut input = llr.iter().copied();
        let mut output = Vec::with_capacity(periods * self.period());
        for _ in 0..periods {
            for &keep in &self.pattern {
                output.push(if keep { input.next().unwrap_or(0.0) } else { 0.0 });
            }
        }
        output
    }
}
