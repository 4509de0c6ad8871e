//! Symbol demodulation
//!
//! Walks the OFDM symbols that follow the preamble. Every symbol is
//! derotated, transformed, equalised with the training gains and phase
//! corrected from its pilots. The first symbol is the SIGNAL field, decoded
//! with hard decisions to learn the rate and length; the rest are soft-demapped
//! into LLRs for the data decoder.

use snafu::{ensure, ResultExt, Snafu};
use tracing::{debug, instrument, trace};

use crate::fec::ConvolutionalCode;
use crate::interleaver::Interleaver;
use crate::kalman::PhaseTracker;
use crate::ofdm::{OfdmFormat, SymbolFft};
use crate::plcp::{parse_field, PlcpError, PlcpHeader, FIELD_BITS};
use crate::qam::{constellation, soft_demap, Complex64};
use crate::rate::RateTable;
use crate::scrambler::{scramble, Padding, HEADER_SEED, TAIL_BITS};
use crate::training::{derotate, Training};
use crate::transmit::{HEADER_RATE, SERVICE_BITS};
use crate::util::Bits;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum DemodError {
    /// Buffer ended before the last expected symbol
    #[snafu(display("symbol {} needs samples up to {}, window has {}", symbol, needed, available))]
    InsufficientSamples {
        symbol: usize,
        needed: usize,
        available: usize,
    },

    /// SIGNAL field rejected
    #[snafu(display("SIGNAL field: {}", source))]
    Header { source: PlcpError },

    /// Fewer coded LLRs than the header promised
    #[snafu(display("{} LLRs recovered, {} expected", len, expected))]
    Truncated { len: usize, expected: usize },
}

/// LLRs and bookkeeping for one demodulated frame
#[derive(Debug, Clone)]
pub struct Demodulated {
    /// Rate-1/2 LLRs covering service, payload, FCS and tail bits
    pub llr: Vec<f64>,
    /// Payload plus FCS length in bits
    pub length_bits: usize,
    pub rate_index: usize,
    /// Samples used from the start of the SIGNAL symbol
    pub consumed: usize,
}

/// Shared read-only context for demodulation
#[derive(Debug, Clone, Copy)]
pub struct DemodContext<'a> {
    pub format: &'a OfdmFormat,
    pub fft: &'a SymbolFft,
    pub code: &'a ConvolutionalCode,
    pub rates: &'a RateTable,
}

/// Equalised and phase-corrected data subcarriers of one symbol
struct SymbolStream<'a> {
    window: &'a [Complex64],
    training: &'a Training,
    ctx: DemodContext<'a>,
    tracker: PhaseTracker,
    data_bins: Vec<usize>,
    pilot_bins: Vec<usize>,
}

impl<'a> SymbolStream<'a> {
    fn symbol(&mut self, index: usize) -> Result<Vec<Complex64>, DemodError> {
        let format = self.ctx.format;
        let start = self.training.offset + index * format.symbol_len() + format.ncp;
        let end = start + format.nfft;
        ensure!(
            end <= self.window.len(),
            InsufficientSamplesSnafu {
                symbol: index,
                needed: end,
                available: self.window.len()
            }
        );

        let samples = derotate(&self.window[start..end], self.training.cfo_hz, format.fs, start);
        let spectrum: Vec<Complex64> = self
            .ctx
            .fft
            .forward(&samples)
            .iter()
            .zip(self.training.gains.iter())
            .map(|(y, g)| y * g)
            .collect();

        let polarity = format.polarity(index);
        let pilot_sum: Complex64 = self
            .pilot_bins
            .iter()
            .zip(format.pilot_template.iter())
            .map(|(&bin, &template)| spectrum[bin] * polarity * template)
            .sum();
        let correction = self.tracker.update(pilot_sum);
        trace!(symbol = index, drift = self.tracker.drift(), "pilot correction");

        Ok(self.data_bins.iter().map(|&bin| spectrum[bin] * correction).collect())
    }
}

/// Coded bits in the data field for a payload of `length_bits` (FCS included)
fn coded_length(length_bits: usize) -> usize {
    2 * (SERVICE_BITS + length_bits + TAIL_BITS)
}

/// Decode the SIGNAL symbol; returns the header and the noise dispersion
/// measured against its re-encoded constellation points
fn decode_header(data: &[Complex64], ctx: &DemodContext) -> Result<(PlcpHeader, f64), DemodError> {
    let rate = ctx.rates.get(HEADER_RATE);
    let interleaver = Interleaver::new(rate.coded_bits_per_symbol, rate.bits_per_subcarrier);

    let hard: Bits = data.iter().map(|d| d.re > 0.0).collect();
    let coded = interleaver.apply_bits(&hard, true);
    let llr: Vec<f64> = coded.iter().by_vals().map(|b| if b { 1.0 } else { -1.0 }).collect();

    let scrambled = ctx.code.decode(&llr, FIELD_BITS);
    let field = scramble(&scrambled, Padding::None, HEADER_SEED);
    let header = parse_field(ctx.rates, &field).context(HeaderSnafu)?;

    // re-encode the decoded field, tail included, to measure dispersion
    let mut terminated = scrambled.clone();
    terminated.resize(rate.data_bits_per_symbol, false);
    let ideal = rate
        .constellation()
        .map_bits(&interleaver.apply_bits(&ctx.code.encode(&terminated), false));
    let errors: Vec<Complex64> = data.iter().zip(ideal.iter()).map(|(d, i)| d - i).collect();
    let mean = errors.iter().sum::<Complex64>() / errors.len() as f64;
    let dispersion = errors.iter().map(|e| (e - mean).norm_sqr()).sum::<f64>() / errors.len() as f64;

    Ok((header, dispersion))
}

/// Demodulate the frame whose SIGNAL symbol starts at `training.offset`
///
/// The SIGNAL symbol is decoded first to learn the rate and length, then every
/// data symbol is equalised, pilot corrected and soft demapped.
///
/// # Arguments
///
/// * `window` - Samples from the candidate frame start, covering the whole frame
/// * `training` - Output of [`train`](crate::training::train) on the same window
/// * `ctx` - Format, FFT, code and rate table shared by every frame
/// * `tracker` - Phase tracker seeded from the training statistics
///
/// # Returns
///
/// Depunctured rate-1/2 LLRs ready for the Viterbi decoder, with the payload
/// length and the samples used from `training.offset`. Fails on a corrupt
/// SIGNAL field or when the window ends before the last data symbol.
#[instrument(level = "debug", skip_all, fields(offset = training.offset))]
pub fn demodulate(
    window: &[Complex64],
    training: &Training,
    ctx: DemodContext,
    tracker: PhaseTracker,
) -> Result<Demodulated, DemodError> {
    let mut stream = SymbolStream {
        window,
        training,
        ctx,
        tracker,
        data_bins: ctx.format.data_bins(),
        pilot_bins: ctx.format.pilot_bins(),
    };

    let header_data = stream.symbol(0)?;
    let (header, dispersion) = decode_header(&header_data, &ctx)?;
    let rate = ctx.rates.get(header.rate_index);
    let length_bits = 8 * (header.length_octets + 4);
    let expected = coded_length(length_bits);
    let data_bits = SERVICE_BITS + length_bits + TAIL_BITS;
    let n_data = (data_bits + rate.data_bits_per_symbol - 1) / rate.data_bits_per_symbol;
    debug!(
        rate = header.rate_index,
        length = header.length_octets,
        symbols = n_data,
        dispersion,
        "SIGNAL decoded"
    );

    let points = constellation(rate.bits_per_subcarrier);
    let min_distance = points.min_distance();
    let mut demapped = Vec::with_capacity(n_data * rate.coded_bits_per_symbol);
    for index in 1..=n_data {
        let data = stream.symbol(index)?;
        demapped.extend(soft_demap(
            &data,
            points,
            min_distance,
            dispersion,
            rate.bits_per_subcarrier,
        ));
    }

    let deinterleaved = Interleaver::new(rate.coded_bits_per_symbol, rate.bits_per_subcarrier)
        .apply(&demapped, true);
    let mut llr = rate.puncturing_mask().depuncture(&deinterleaved);
    ensure!(
        llr.len() >= expected,
        TruncatedSnafu {
            len: llr.len(),
            expected
        }
    );
    llr.truncate(expected);

    Ok(Demodulated {
        llr,
        length_bits,
        rate_index: header.rate_index,
        consumed: (1 + n_data) * ctx.format.symbol_len(),
    })
}
