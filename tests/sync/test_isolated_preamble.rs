//! Candidate detection on a lone preamble

use rustywifi::ofdm::{OfdmFormat, SymbolFft};
use rustywifi::simulation::{pad, Channel};
use rustywifi::sync::{periodicity_score, synchronize, SyncConfig};

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::init_test_tracing;

/// Leading silence, a multiple of the short training period
const LEAD: usize = 112;

fn preamble_buffer(format: &OfdmFormat) -> Vec<rustywifi::qam::Complex64> {
    let fft = SymbolFft::new(format.nfft);
    pad(&format.preamble(&fft), LEAD, 96)
}

#[test]
fn test_single_candidate_at_preamble() {
    init_test_tracing();
    let format = OfdmFormat::default();
    let samples = preamble_buffer(&format);
    let starts = synchronize(&samples, &format, &SyncConfig::default());
    assert_eq!(starts, vec![LEAD]);
}

#[test]
fn test_score_peaks_over_short_training() {
    let format = OfdmFormat::default();
    let samples = preamble_buffer(&format);
    let score = periodicity_score(&samples, &format);
    let (peak, value) = score
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |best, (k, &v)| if v > best.1 { (k, v) } else { best });
    // the candidate start backs off 64 samples from the peak block
    assert_eq!(peak * format.sts_period() - 64, LEAD);
    // unit power over 9 blocks of 16 lags
    assert!((value - 144.0).abs() < 1e-6, "peak score {}", value);
}

#[test]
fn test_candidate_survives_noise() {
    let format = OfdmFormat::default();
    let fft = SymbolFft::new(format.nfft);
    let channel = Channel {
        snr_db: Some(15.0),
        cfo_hz: 40e3,
        delay: LEAD,
        trailing: 96,
        seed: 3,
    };
    let samples = channel.apply(&format.preamble(&fft), format.fs);
    let starts = synchronize(&samples, &format, &SyncConfig::default());
    assert_eq!(starts.len(), 1);
    assert!(starts[0].abs_diff(LEAD) <= format.sts_period(), "start {}", starts[0]);
}
