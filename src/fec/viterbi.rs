//! Soft-decision Viterbi decoder
//!
//! Branch metrics are correlations between the expected encoder outputs
//! (mapped to +/-1) and the received LLRs, so erased positions (LLR 0)
//! contribute nothing. Survivor decisions are stored as one bit per state
//! per step and resolved in a single traceback at the end of the block.

use tracing::trace;

use super::ConvolutionalCode;
use crate::util::Bits;

pub fn decode(code: &ConvolutionalCode, llr: &[f64], n_bits: usize) -> Bits {
    let memory = code.constraint_length - 1;
    let num_states = code.num_states();
    assert!(num_states <= 64, "decision words hold at most 64 states");

    let available = llr.len() / 2;
    // A block that carries its tail bits ends in state 0
    let terminated = available >= n_bits + memory;
    let steps = if terminated { n_bits + memory } else { available };

    // Expected output pair for every (predecessor msb, next state) branch
    let branch_outputs: Vec<[f64; 2]> = (0..2 * num_states)
        .map(|full| {
            let [a, b] = code.outputs(full);
            [if a { 1.0 } else { -1.0 }, if b { 1.0 } else { -1.0 }]
        })
        .collect();

    let mut metrics = vec![f64::NEG_INFINITY; num_states];
    metrics[0] = 0.0;
    let mut next = vec![0.0; num_states];
    let mut decisions: Vec<u64> = Vec::with_capacity(steps);

    for step in 0..steps {
        let (l0, l1) = (llr[2 * step], llr[2 * step + 1]);
        let mut word = 0u64;
        let mut best = f64::NEG_INFINITY;

        for state in 0..num_states {
            let pred_low = state >> 1;
            let pred_high = pred_low | (1 << (memory - 1));
            let out_low = branch_outputs[state];
            let out_high = branch_outputs[state | (1 << memory)];

            let m_low = metrics[pred_low] + out_low[0] * l0 + out_low[1] * l1;
            let m_high = metrics[pred_high] + out_high[0] * l0 + out_high[1] * l1;
            if m_high > m_low {
                next[state] = m_high;
                word |= 1 << state;
            } else {
                next[state] = m_low;
            }
            best = best.max(next[state]);
        }

        for (metric, &candidate) in metrics.iter_mut().zip(next.iter()) {
            *metric = candidate - best;
        }
        decisions.push(word);
    }

    let mut state = if terminated {
        0
    } else {
        metrics
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(bi, bm), (i, &m)| {
                if m > bm {
                    (i, m)
                } else {
                    (bi, bm)
                }
            })
            .0
    };
    trace!(steps, terminated, final_state = state, "viterbi traceback");

    let mut decoded = vec![false; steps];
    for step in (0..steps).rev() {
        decoded[step] = state & 1 == 1;
        let high = (decisions[step] >> state) & 1;
        state = (state >> 1) | ((high as usize) << (memory - 1));
    }

    decoded.into_iter().take(n_bits).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitvec::prelude::*;

    fn to_llr(coded: &BitSlice<u8, Lsb0>) -> Vec<f64> {
        coded.iter().by_vals().map(|b| if b { 1.0 } else { -1.0 }).collect()
    }

    fn message(n: usize) -> Bits {
        let mut bits: Bits = (0..n).map(|i| (i * 37 + i / 5) % 11 < 5).collect();
        bits.resize(n + 6, false);
        bits
    }

    #[test]
    fn test_clean_round_trip() {
        let code = ConvolutionalCode::default();
        let bits = message(200);
        let llr = to_llr(&code.encode(&bits));
        assert_eq!(decode(&code, &llr, 200), bits[..200]);
    }

    #[test]
    fn test_corrects_scattered_errors() {
        let code = ConvolutionalCode::default();
        let bits = message(300);
        let mut llr = to_llr(&code.encode(&bits));
        for position in (5..llr.len()).step_by(41) {
            llr[position] = -llr[position];
        }
        assert_eq!(decode(&code, &llr, 300), bits[..300]);
    }

    #[test]
    fn test_erasures_are_neutral() {
        let code = ConvolutionalCode::default();
        let bits = message(120);
        let mut llr = to_llr(&code.encode(&bits));
        for position in (3..llr.len()).step_by(6) {
            llr[position] = 0.0;
        }
        assert_eq!(decode(&code, &llr, 120), bits[..120]);
    }

    #[test]
    fn test_unterminated_block() {
        let code = ConvolutionalCode::default();
        let bits = message(64);
        let llr = to_llr(&code.encode(&bits[..64]));
        // No tail: decoding falls back to the best surviving state
        assert_eq!(decode(&code, &llr, 64), bits[..64]);
    }
}
