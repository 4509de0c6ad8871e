//! Candidates over complete frames

use rustywifi::simulation::pad;
use rustywifi::sync::{synchronize, SyncConfig};
use rustywifi::Transmitter;

#[path = "../test_utils.rs"]
mod test_utils;
use test_utils::random_payload;

#[test]
fn test_frame_start_is_a_candidate() {
    let tx = Transmitter::default();
    let format = tx.format();
    for lead in [0usize, 160, 400, 1024] {
        let samples = pad(&tx.encode(&random_payload(80, 4), 3), lead, 200);
        let starts = synchronize(&samples, format, &SyncConfig::default());
        assert_eq!(starts.first(), Some(&lead), "lead {}", lead);
    }
}

#[test]
fn test_candidates_ascending() {
    let tx = Transmitter::default();
    let mut waveform = tx.encode(&random_payload(300, 8), 1);
    waveform.extend(tx.encode(&random_payload(40, 9), 6));
    let samples = pad(&waveform, 400, 400);
    let starts = synchronize(&samples, tx.format(), &SyncConfig::default());
    assert!(starts.windows(2).all(|w| w[0] < w[1]));
    assert!(starts.contains(&400));
}
