//! Constellation mapping and soft demapping
//!
//! Square Gray-coded constellations (BPSK, QPSK, 16-QAM, 64-QAM) normalised
//! to unit average energy. The first bit of each group selects the most
//! significant in-phase level bit, the in-phase bits precede the quadrature
//! bits.

use bitvec::prelude::*;
use lazy_static::lazy_static;
use num::Complex;

pub type Complex64 = Complex<f64>;

/// Point table for one modulation order
#[derive(Debug, Clone)]
pub struct Constellation {
    /// Bits carried per point
    pub bits_per_symbol: usize,
    /// Points indexed by the integer formed from the bit group (first bit = MSB)
    pub points: Vec<Complex64>,
}

/// Decode a Gray-coded level index
fn gray_to_binary(gray: usize) -> usize {
    let mut binary = gray;
    let mut shift = gray >> 1;
    while shift != 0 {
        binary ^= shift;
        shift >>= 1;
    }
    binary
}

/// Amplitude level for `bits` Gray-coded bits on one axis
fn axis_level(gray: usize, bits: usize) -> f64 {
    (2 * gray_to_binary(gray)) as f64 - ((1 << bits) - 1) as f64
}

impl Constellation {
    pub fn new(bits_per_symbol: usize) -> Self {
        let points = match bits_per_symbol {
            1 => vec![Complex64::new(-1.0, 0.0), Complex64::new(1.0, 0.0)],
            2 | 4 | 6 => {
                let axis_bits = bits_per_symbol / 2;
                let mask = (1 << axis_bits) - 1;
                let unscaled: Vec<Complex64> = (0..1usize << bits_per_symbol)
                    .map(|index| {
                        Complex64::new(
                            axis_level(index >> axis_bits, axis_bits),
                            axis_level(index & mask, axis_bits),
                        )
                    })
                    .collect();
                let energy =
                    unscaled.iter().map(|p| p.norm_sqr()).sum::<f64>() / unscaled.len() as f64;
                unscaled.iter().map(|p| p / energy.sqrt()).collect()
            }
            _ => panic!("unsupported modulation order: {} bits per symbol", bits_per_symbol),
        };
        Self {
            bits_per_symbol,
            points,
        }
    }

    /// Smallest distance between adjacent in-phase levels
    pub fn min_distance(&self) -> f64 {
        let mut levels: Vec<f64> = self.points.iter().map(|p| p.re).collect();
        levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(core::cmp::Ordering::Equal));
        levels.dedup_by(|a, b| (*a - *b).abs() < 1e-12);
        levels
            .windows(2)
            .map(|w| w[1] - w[0])
            .fold(f64::INFINITY, f64::min)
    }

    /// Map a bit stream onto constellation points
    ///
    /// A trailing partial group is dropped.
    pub fn map_bits(&self, bits: &BitSlice<u8, Lsb0>) -> Vec<Complex64> {
        bits.chunks_exact(self.bits_per_symbol)
            .map(|group| {
                let index = group
                    .iter()
                    .by_vals()
                    .fold(0usize, |acc, bit| (acc << 1) | bit as usize);
                self.points[index]
            })
            .collect()
    }
}

lazy_static! {
    static ref CONSTELLATIONS: [Constellation; 4] = [
        Constellation::new(1),
        Constellation::new(2),
        Constellation::new(4),
        Constellation::new(6),
    ];
}

/// Shared constellation table for a modulation order (1, 2, 4 or 6 bits)
pub fn constellation(bits_per_symbol: usize) -> &'static Constellation {
    match bits_per_symbol {
        1 => &CONSTELLATIONS[0],
        2 => &CONSTELLATIONS[1],
        4 => &CONSTELLATIONS[2],
        6 => &CONSTELLATIONS[3],
        _ => panic!("unsupported modulation order: {} bits per symbol", bits_per_symbol),
    }
}

/// Max-log soft demapper
///
/// Returns `bits_per_symbol` LLRs per sample, in transmit bit order.
/// Positive values favour a 1. `noise_variance` is the complex noise
/// variance; it is floored relative to `min_distance` so a noiseless channel
/// still yields finite LLRs.
pub fn soft_demap(
    samples: &[Complex64],
    constellation: &Constellation,
    min_distance: f64,
    noise_variance: f64,
    bits_per_symbol: usize,
) -> Vec<f64> {
    let variance = noise_variance.max(1e-3 * min_distance * min_distance);
    let mut llr = Vec::with_capacity(samples.len() * bits_per_symbol);

    for &y in samples {
        let distances: Vec<f64> = constellation
            .points
            .iter()
            .map(|p| (y - p).norm_sqr())
            .collect();

        for bit in (0..bits_per_symbol).rev() {
            let mut best_zero = f64::INFINITY;
            let mut best_one = f64::INFINITY;
            for (index, &d) in distances.iter().enumerate() {
                if (index >> bit) & 1 == 1 {
                    best_one = best_one.min(d);
                } else {
                    best_zero = best_zero.min(d);
                }
            }
            llr.push((best_zero - best_one) / variance);
        }
    }
    llr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Bits;

    #[test]
    fn test_unit_energy() {
        for bits in [1, 2, 4, 6] {
            let c = constellation(bits);
            assert_eq!(c.points.len(), 1 << bits);
            let energy = c.points.iter().map(|p| p.norm_sqr()).sum::<f64>() / c.points.len() as f64;
            assert!((energy - 1.0).abs() < 1e-12, "{} bits: energy {}", bits, energy);
        }
    }

    #[test]
    fn test_gray_levels_64qam() {
        // 64-QAM in-phase levels for b0b1b2 = 000, 001, 011, 010, 110, 111, 101, 100
        let c = constellation(6);
        let scale = 42f64.sqrt();
        let expected = [(0b000, -7.0), (0b001, -5.0), (0b011, -3.0), (0b010, -1.0),
                        (0b110, 1.0), (0b111, 3.0), (0b101, 5.0), (0b100, 7.0)];
        for (i_bits, level) in expected {
            let point = c.points[i_bits << 3];
            assert!((point.re * scale - level).abs() < 1e-9, "bits {:03b}", i_bits);
        }
    }

    #[test]
    fn test_min_distance() {
        assert!((constellation(1).min_distance() - 2.0).abs() < 1e-12);
        assert!((constellation(4).min_distance() - 2.0 / 10f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_soft_demap_recovers_bits() {
        for bits_per_symbol in [1, 2, 4, 6] {
            let c = constellation(bits_per_symbol);
            let bits: Bits = (0..bits_per_symbol * 64).map(|i| (i * 13 + i / 3) % 7 < 3).collect();
            let points = c.map_bits(&bits);
            let noisy: Vec<Complex64> = points.iter().map(|p| p + Complex64::new(0.01, -0.01)).collect();
            let llr = soft_demap(&noisy, c, c.min_distance(), 0.01, bits_per_symbol);
            assert_eq!(llr.len(), bits.len());
            for (i, (l, b)) in llr.iter().zip(bits.iter().by_vals()).enumerate() {
                assert_eq!(*l > 0.0, b, "bit {} with {} bits/symbol", i, bits_per_symbol);
            }
        }
    }
}
