//! Channel training
//!
//! Estimates everything the demodulator needs from the preamble of one
//! candidate: carrier frequency offset (coarse from the short training
//! sequence, fine from the two long training symbols), a per-subcarrier
//! Wiener channel gain with timing refinement, the SNR, and the noise
//! figures that seed the phase tracker.

use std::f64::consts::PI;

use snafu::{ensure, OptionExt, Snafu};
use tracing::{debug, instrument, trace};

use crate::ofdm::{OfdmFormat, SymbolFft};
use crate::qam::Complex64;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum TrainingError {
    /// Window shorter than the preamble plus the timing search span
    #[snafu(display("training needs {} samples, window has {}", needed, available))]
    InsufficientSamples { needed: usize, available: usize },

    /// Preamble region carries no energy
    #[snafu(display("training window is silent"))]
    Silent,
}

/// Configuration for channel training
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Long training offsets searched on each side of the nominal position
    pub timing_search: usize,
    /// Upper bound on the linear SNR estimate
    pub snr_ceiling: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            timing_search: 8,
            snr_ceiling: 1e6,
        }
    }
}

/// Result of training on one candidate
#[derive(Debug, Clone)]
pub struct Training {
    /// Channel gain per FFT bin
    pub gains: Vec<Complex64>,
    /// Total carrier frequency offset in Hz
    pub cfo_hz: f64,
    /// Standard deviation of the residual phase, radians per symbol
    pub phase_uncertainty: f64,
    /// Noise variance per subcarrier
    pub noise_variance: f64,
    /// Start of the SIGNAL symbol (including its cyclic prefix) in the window
    pub offset: usize,
    pub snr_db: f64,
}

/// Undo a carrier offset on `samples`, whose first element sits at
/// `first_index` samples into the window
pub fn derotate(samples: &[Complex64], cfo_hz: f64, fs: f64, first_index: usize) -> Vec<Complex64> {
    let step = -2.0 * PI * cfo_hz / fs;
    samples
        .iter()
        .enumerate()
        .map(|(n, &x)| x * Complex64::from_polar(1.0, step * (first_index + n) as f64))
        .collect()
}

/// Variance of complex values, `mean(|z - mean(z)|^2)`
fn complex_variance(values: &[Complex64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<Complex64>() / n;
    values.iter().map(|v| (v - mean).norm_sqr()).sum::<f64>() / n
}

/// Carrier offset from the phase of the correlation between repetitions
/// `lag_samples` apart
fn offset_from_correlation(correlation: Complex64, lag_samples: usize, fs: f64) -> f64 {
    -correlation.arg() / (2.0 * PI * lag_samples as f64 / fs)
}

/// Wiener channel estimate over `ts_reps` long training symbols at `lts`
fn wiener_filter(
    lts: &[Complex64],
    format: &OfdmFormat,
    fft: &SymbolFft,
    snr_ceiling: f64,
) -> (Vec<Complex64>, f64) {
    let reps: Vec<Vec<Complex64>> = lts
        .chunks_exact(format.nfft)
        .take(format.ts_reps)
        .map(|symbol| fft.forward(symbol))
        .collect();
    let count = reps.len() as f64;

    let gains: Vec<Complex64> = (0..format.nfft)
        .map(|bin| {
            let mean = reps.iter().map(|r| r[bin]).sum::<Complex64>() / count;
            let power = reps.iter().map(|r| r[bin].norm_sqr()).sum::<f64>() / count;
            if power > 0.0 {
                mean.conj() * format.lts_freq[bin] / power
            } else {
                Complex64::new(0.0, 0.0)
            }
        })
        .collect();

    let residuals: Vec<Complex64> = reps
        .iter()
        .flat_map(|r| {
            r.iter()
                .zip(gains.iter())
                .zip(format.lts_freq.iter())
                .map(|((y, g), l)| g * y - l)
        })
        .collect();
    let variance = complex_variance(&residuals);
    let snr = if variance > 0.0 {
        (1.0 / variance).min(snr_ceiling)
    } else {
        snr_ceiling
    };
    (gains, snr)
}

/// Highest-SNR `(offset, estimate, snr)`, ties going to the earliest offset
fn strongest_timing<T>(estimates: impl IntoIterator<Item = (usize, T, f64)>) -> Option<(usize, T, f64)> {
    estimates
        .into_iter()
        .reduce(|best, e| if e.2 > best.2 { e } else { best })
}

/// Samples a window needs for training
pub fn required_samples(format: &OfdmFormat, config: &TrainingConfig) -> usize {
    format.sts_len() + format.lts_cp() + config.timing_search + format.ts_reps * format.nfft
}

/// Train on a window starting at a candidate frame start
///
/// Estimates the carrier offset from the short then long training fields,
/// derotates the preamble and fits per-bin channel gains at each timing offset
/// around the nominal long training position, keeping the one with the highest
/// SNR (earliest on ties).
///
/// # Arguments
///
/// * `window` - Samples beginning at the candidate start, at least
///   [`required_samples`] long
/// * `format` - OFDM format the frame was sent with
/// * `fft` - Forward FFT of `format.nfft` points
/// * `config` - Timing search span and SNR ceiling
///
/// # Returns
///
/// Gains, carrier offset, noise statistics and the SIGNAL symbol offset.
/// Fails when the window is too short or the preamble region is silent.
#[instrument(level = "debug", skip_all, fields(len = window.len()))]
pub fn train(
    window: &[Complex64],
    format: &OfdmFormat,
    fft: &SymbolFft,
    config: &TrainingConfig,
) -> Result<Training, TrainingError> {
    let needed = required_samples(format, config);
    ensure!(
        window.len() >= needed,
        InsufficientSamplesSnafu {
            needed,
            available: window.len()
        }
    );
    let fs = format.fs;

    // coarse offset from the short training sequence
    let period = format.sts_period();
    let sts = &window[..format.sts_len()];
    let correlation: Complex64 = sts[..sts.len() - period]
        .iter()
        .zip(sts[period..].iter())
        .map(|(a, b)| a * b.conj())
        .sum();
    let coarse = offset_from_correlation(correlation, period, fs);
    let region = derotate(&window[..needed], coarse, fs, 0);

    // fine offset from consecutive long training spectra
    let lts_start = format.sts_len();
    let spectra: Vec<Vec<Complex64>> = region[lts_start..lts_start + format.ts_reps * format.nfft]
        .chunks_exact(format.nfft)
        .map(|symbol| {
            let mut spectrum = fft.forward(symbol);
            for (value, reference) in spectrum.iter_mut().zip(format.lts_freq.iter()) {
                if reference.norm_sqr() == 0.0 {
                    *value = Complex64::new(0.0, 0.0);
                }
            }
            spectrum
        })
        .collect();
    let correlation: Complex64 = spectra
        .windows(2)
        .flat_map(|pair| pair[0].iter().zip(pair[1].iter()).map(|(a, b)| a * b.conj()))
        .sum();
    let fine = offset_from_correlation(correlation, format.nfft, fs);
    let region = derotate(&region, fine, fs, 0);
    let cfo_hz = coarse + fine;
    trace!(coarse, fine, "carrier offset");

    // channel estimate at each candidate timing
    let nominal = format.sts_len() + format.lts_cp();
    let lts_span = format.ts_reps * format.nfft;
    let search = nominal - config.timing_search..nominal + config.timing_search;
    let estimates: Vec<(usize, Vec<Complex64>, f64)> = search
        .map(|offset| {
            let (gains, snr) = wiener_filter(&region[offset..offset + lts_span], format, fft, config.snr_ceiling);
            (offset, gains, snr)
        })
        .collect();

    let (offset, gains, snr) = strongest_timing(estimates).context(SilentSnafu)?;

    let var_in = complex_variance(&region[..format.preamble_len()]);
    ensure!(var_in > 0.0, SilentSnafu);
    let used = format.num_used() as f64;
    let var_n = var_in / (snr * used / format.nfft as f64 + 1.0);
    let var_x = var_in - var_n;
    let var_y = 2.0 * var_n * var_x + var_n * var_n;
    let lts_period = format.nfft as f64 / fs;
    let uncertainty_hz = (var_y.sqrt() / var_x).atan() / (2.0 * PI * lts_period) / (format.nfft as f64).sqrt();
    let phase_uncertainty = 2.0 * PI * uncertainty_hz * format.symbol_len() as f64 / fs;
    let noise_variance = var_x / used / snr;
    let snr_db = 10.0 * snr.log10();

    debug!(cfo_hz, snr_db, offset, "trained");
    Ok(Training {
        gains,
        cfo_hz,
        phase_uncertainty,
        noise_variance,
        offset: offset + lts_span,
        snr_db,
    })
}
