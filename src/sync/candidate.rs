//! Candidate frame starts
//!
//! Non-maximum suppression over the periodicity score.

use tracing::{debug, instrument, trace};

use super::{periodicity_score, SyncConfig};
use crate::ofdm::OfdmFormat;
use crate::qam::Complex64;

/// Indices of strict local maxima
///
/// A score is kept only if it is greater than every score within
/// `neighborhood` positions on either side; positions past either end count
/// as zero.
pub fn find_peaks(score: &[f64], neighborhood: usize) -> Vec<usize> {
    (0..score.len())
        .filter(|&i| {
            let value = score[i];
            let low = i.saturating_sub(neighborhood);
            let high = (i + neighborhood).min(score.len() - 1);
            let padded = i < neighborhood || i + neighborhood >= score.len();
            if padded && value <= 0.0 {
                return false;
            }
            (low..=high).all(|j| j == i || value > score[j])
        })
        .collect()
}

/// Candidate frame start offsets in `samples`, ascending
///
/// An empty result means no preamble was detected.
#[instrument(level = "debug", skip_all, fields(len = samples.len()))]
pub fn synchronize(samples: &[Complex64], format: &OfdmFormat, config: &SyncConfig) -> Vec<usize> {
    let score = periodicity_score(samples, format);
    let period = format.sts_period();

    let starts: Vec<usize> = find_peaks(&score, config.neighborhood)
        .into_iter()
        .map(|k| {
            trace!(block = k, score = score[k], "periodicity peak");
            (period * k).saturating_sub(config.backoff)
        })
        .collect();

    if starts.is_empty() {
        debug!("no preamble detected");
    } else {
        debug!(candidates = starts.len(), "synchronized");
    }
    starts
}
