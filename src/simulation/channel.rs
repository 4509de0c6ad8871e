use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::debug;

use crate::qam::Complex64;

/// Channel impairments applied by [`Channel::apply`]
#[derive(Debug, Clone)]
pub struct Channel {
    /// SNR relative to the mean waveform power; `None` disables noise
    pub snr_db: Option<f64>,
    /// Carrier frequency offset in Hz
    pub cfo_hz: f64,
    /// Zero samples inserted before the waveform
    pub delay: usize,
    /// Zero samples appended after the waveform
    pub trailing: usize,
    /// Seed for the noise generator
    pub seed: u64,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            snr_db: None,
            cfo_hz: 0.0,
            delay: 0,
            trailing: 0,
            seed: 0,
        }
    }
}

impl Channel {
    /// Pass `waveform`, sampled at `fs`, through the channel
    pub fn apply(&self, waveform: &[Complex64], fs: f64) -> Vec<Complex64> {
        let signal_power = mean_power(waveform);
        let mut samples = pad(waveform, self.delay, self.trailing);
        apply_cfo(&mut samples, self.cfo_hz, fs);

        if let Some(snr_db) = self.snr_db {
            let noise_power = signal_power / 10f64.powf(snr_db / 10.0);
            debug!(snr_db, noise_power, "adding noise");
            let mut rng = StdRng::seed_from_u64(self.seed);
            add_awgn(&mut samples, noise_power, &mut rng);
        }
        samples
    }
}

fn mean_power(samples: &[Complex64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.norm_sqr()).sum::<f64>() / samples.len() as f64
}

/// Surround `waveform` with `before` and `after` zero samples
pub fn pad(waveform: &[Complex64], before: usize, after: usize) -> Vec<Complex64> {
    let zero = Complex64::new(0.0, 0.0);
    let mut padded = Vec::with_capacity(before + waveform.len() + after);
    padded.resize(before, zero);
    padded.extend_from_slice(waveform);
    padded.resize(before + waveform.len() + after, zero);
    padded
}

/// Rotate `samples` by a carrier offset of `cfo_hz`
pub fn apply_cfo(samples: &mut [Complex64], cfo_hz: f64, fs: f64) {
    if cfo_hz == 0.0 {
        return;
    }
    let step = 2.0 * PI * cfo_hz / fs;
    for (n, sample) in samples.iter_mut().enumerate() {
        *sample *= Complex64::from_polar(1.0, step * n as f64);
    }
}

/// Add circular complex Gaussian noise of total power `noise_power`
pub fn add_awgn<R: Rng>(samples: &mut [Complex64], noise_power: f64, rng: &mut R) {
    let sigma = (noise_power / 2.0).sqrt();
    for sample in samples.iter_mut() {
        let re: f64 = rng.sample(StandardNormal);
        let im: f64 = rng.sample(StandardNormal);
        *sample += Complex64::new(re, im) * sigma;
    }
}
