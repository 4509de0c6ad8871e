//! Periodicity score over the short training period

use super::LEADING_BLOCKS;
use crate::ofdm::OfdmFormat;
use crate::qam::Complex64;

/// One score per block of `nfft/4` samples
///
/// Block `k` accumulates `|sum x[t+P] conj(x[t])|` over the blocks covered by
/// the repetition window ending there. Buffers too short to fill one window
/// give an empty score.
pub fn periodicity_score(samples: &[Complex64], format: &OfdmFormat) -> Vec<f64> {
    let period = format.sts_period();
    if samples.len() <= period {
        return Vec::new();
    }

    let products: Vec<Complex64> = samples[period..]
        .iter()
        .zip(samples.iter())
        .map(|(late, early)| late * early.conj())
        .collect();

    let mut cumulative = Vec::with_capacity(LEADING_BLOCKS + products.len() / period);
    let mut running = 0.0;
    cumulative.extend(std::iter::repeat(0.0).take(LEADING_BLOCKS));
    for block in products.chunks_exact(period) {
        running += block.iter().sum::<Complex64>().norm();
        cumulative.push(running);
    }

    let window = format.sts_len() / period;
    if cumulative.len() < window {
        return Vec::new();
    }
    (0..=cumulative.len() - window)
        .map(|k| cumulative[k + window - 1] - cumulative[k])
        .collect()
}
