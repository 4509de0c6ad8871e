//! Multi-frame receiver
//!
//! Runs the complete receive chain over a sample buffer: synchronize, then for
//! each candidate train, demodulate, Viterbi decode, descramble and check the
//! FCS. Candidates that start inside an already decoded frame are skipped, so
//! every decoded frame claims a disjoint range of samples.

use rayon::prelude::*;
use snafu::{ensure, ResultExt, Snafu};
use tracing::{debug, info, instrument};

use crate::crc::{check_fcs, FCS_BITS};
use crate::demod::{demodulate, DemodContext, DemodError};
use crate::fec::ConvolutionalCode;
use crate::kalman::{PhaseTracker, TrackerConfig};
use crate::ofdm::{OfdmFormat, SymbolFft};
use crate::qam::Complex64;
use crate::rate::RateTable;
use crate::scrambler::{scramble, Padding, DATA_SEED};
use crate::sync::{synchronize, SyncConfig};
use crate::training::{train, TrainingConfig, TrainingError};
use crate::transmit::SERVICE_BITS;
use crate::util::ShiftBits;

/// Why a candidate produced no frame
#[derive(Debug, Snafu)]
pub enum FrameError {
    #[snafu(display("training failed: {}", source))]
    Training { source: TrainingError },

    #[snafu(display("demodulation failed: {}", source))]
    Demod { source: DemodError },

    #[snafu(display("frame check sequence mismatch"))]
    FrameCheckMismatch,
}

/// Decoded frame with its position in the buffer
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// Payload octets, FCS removed
    pub payload: Vec<u8>,
    /// Candidate start index
    pub start: usize,
    /// One past the last sample of the frame, as placed by the chosen timing;
    /// up to `timing_search` samples before the true end
    pub end: usize,
    /// SNR estimate from training
    pub snr_db: f64,
}

/// Configuration for the receiver
#[derive(Debug, Clone, Default)]
pub struct DecoderConfig {
    pub sync: SyncConfig,
    pub training: TrainingConfig,
    pub tracker: TrackerConfig,
}

/// Receiver for one OFDM format
#[derive(Debug, Clone)]
pub struct Receiver {
    format: OfdmFormat,
    code: ConvolutionalCode,
    rates: RateTable,
    config: DecoderConfig,
    fft: SymbolFft,
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new(OfdmFormat::default(), ConvolutionalCode::default(), DecoderConfig::default())
    }
}

impl Receiver {
    pub fn new(format: OfdmFormat, code: ConvolutionalCode, config: DecoderConfig) -> Self {
        let rates = RateTable::new(&format);
        let fft = SymbolFft::new(format.nfft);
        Self {
            format,
            code,
            rates,
            config,
            fft,
        }
    }

    pub fn format(&self) -> &OfdmFormat {
        &self.format
    }

    /// Decode every frame in `samples`, in order of their start
    ///
    /// Each synchronization candidate is trained, demodulated and checked
    /// against its FCS. A candidate that starts before the end of the last
    /// decoded frame is skipped, so one transmission yields one frame even
    /// when several candidates fall on its preamble.
    ///
    /// # Arguments
    ///
    /// * `samples` - Complex baseband at the receiver's sample rate
    ///
    /// # Returns
    ///
    /// Frames that passed the FCS check, with disjoint `start..end` ranges.
    /// Rejected candidates are only logged at `debug`.
    #[instrument(level = "debug", skip_all, fields(len = samples.len()))]
    pub fn decode(&self, samples: &[Complex64]) -> Vec<DecodedFrame> {
        let min_size = self.format.preamble_len() + self.format.ncp + self.format.nfft;
        let mut frames: Vec<DecodedFrame> = Vec::new();
        let mut end = 0;

        for start in synchronize(samples, &self.format, &self.config.sync) {
            if start < end {
                // inside a frame we already decoded
                continue;
            }
            let window = &samples[start..];
            if window.len() <= min_size {
                continue;
            }

            match self.decode_candidate(window) {
                Ok((payload, consumed, snr_db)) => {
                    end = start + consumed;
                    info!(start, end, len = payload.len(), snr_db, "frame decoded");
                    frames.push(DecodedFrame {
                        payload,
                        start,
                        end,
                        snr_db,
                    });
                }
                Err(err) => debug!(start, error = %err, "candidate rejected"),
            }
        }
        frames
    }

    /// Decode independent buffers in parallel
    pub fn decode_batch(&self, buffers: &[Vec<Complex64>]) -> Vec<Vec<DecodedFrame>> {
        buffers.par_iter().map(|samples| self.decode(samples)).collect()
    }

    /// Returns the payload, samples used from the window start and SNR
    fn decode_candidate(&self, window: &[Complex64]) -> Result<(Vec<u8>, usize, f64), FrameError> {
        let training = train(window, &self.format, &self.fft, &self.config.training).context(TrainingSnafu)?;
        let tracker = PhaseTracker::new(
            training.phase_uncertainty,
            training.noise_variance,
            &self.config.tracker,
        );
        let ctx = DemodContext {
            format: &self.format,
            fft: &self.fft,
            code: &self.code,
            rates: &self.rates,
        };
        let demodulated = demodulate(window, &training, ctx, tracker).context(DemodSnafu)?;

        let scrambled = self
            .code
            .decode(&demodulated.llr, SERVICE_BITS + demodulated.length_bits);
        let bits = scramble(&scrambled, Padding::None, DATA_SEED);
        let body = &bits[SERVICE_BITS..];
        ensure!(check_fcs(body), FrameCheckMismatchSnafu);

        let payload = body[..body.len() - FCS_BITS]
            .chunks(8)
            .map(u8::shift_in)
            .collect();
        Ok((payload, training.offset + demodulated.consumed, training.snr_db))
    }
}

/// Decode a buffer with the default receiver
pub fn decode(samples: &[Complex64]) -> Vec<DecodedFrame> {
    Receiver::default().decode(samples)
}
