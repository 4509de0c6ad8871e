//! FFT plans for one OFDM symbol length

use std::fmt;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner};

use crate::qam::Complex64;

/// Forward and inverse plans for a fixed transform size
///
/// Both transforms are unnormalised, matching `rustfft`.
#[derive(Clone)]
pub struct SymbolFft {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    len: usize,
}

impl SymbolFft {
    pub fn new(len: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Spectrum of the first `len` samples
    pub fn forward(&self, samples: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = samples[..self.len].to_vec();
        self.forward.process(&mut buffer);
        buffer
    }

    /// Time-domain samples for a full set of bins
    pub fn inverse(&self, bins: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = bins[..self.len].to_vec();
        self.inverse.process(&mut buffer);
        buffer
    }
}

impl fmt::Debug for SymbolFft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolFft").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_of_forward() {
        let fft = SymbolFft::new(64);
        let samples: Vec<Complex64> = (0..64)
            .map(|n| Complex64::new((n as f64 * 0.3).cos(), (n as f64 * 0.7).sin()))
            .collect();
        let restored = fft.inverse(&fft.forward(&samples));
        for (a, b) in samples.iter().zip(restored.iter()) {
            assert!((a - b / 64.0).norm() < 1e-12);
        }
    }

    #[test]
    fn test_single_tone_lands_in_bin() {
        let fft = SymbolFft::new(64);
        let tone: Vec<Complex64> = (0..64)
            .map(|n| Complex64::from_polar(1.0, 2.0 * std::f64::consts::PI * 5.0 * n as f64 / 64.0))
            .collect();
        let spectrum = fft.forward(&tone);
        assert!((spectrum[5].norm() - 64.0).abs() < 1e-9);
        assert!(spectrum[6].norm() < 1e-9);
    }
}
