//! Transmit pipeline
//!
//! payload -> service bits + payload + FCS -> scramble -> convolutional encode
//! -> puncture -> interleave -> map -> OFDM symbols, with the SIGNAL field run
//! through the same chain at the most robust rate.

use bitvec::prelude::*;
use tracing::{debug, instrument};

use crate::crc::append_fcs;
use crate::fec::ConvolutionalCode;
use crate::interleaver::Interleaver;
use crate::ofdm::OfdmFormat;
use crate::plcp::{build_field, MAX_LENGTH};
use crate::qam::Complex64;
use crate::rate::{Rate, RateTable};
use crate::scrambler::{scramble, Padding, DATA_SEED, HEADER_SEED};
use crate::util::{bits_from_octets, Bits};

/// Zero bits sent in front of the payload
pub const SERVICE_BITS: usize = 16;

/// Rate index used for the SIGNAL field
pub const HEADER_RATE: usize = 0;

/// Encoder for complete frames
#[derive(Debug, Clone, Default)]
pub struct Transmitter {
    format: OfdmFormat,
    code: ConvolutionalCode,
    rates: RateTable,
}

impl Transmitter {
    pub fn new(format: OfdmFormat, code: ConvolutionalCode) -> Self {
        let rates = RateTable::new(&format);
        Self { format, code, rates }
    }

    pub fn format(&self) -> &OfdmFormat {
        &self.format
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Encode one frame carrying `payload` at `rate_index`
    ///
    /// # Arguments
    ///
    /// * `payload` - Octets to send; the FCS is appended here
    /// * `rate_index` - Row of the rate table, 0 (BPSK 1/2) to 7 (64-QAM 3/4)
    ///
    /// # Returns
    ///
    /// Preamble, SIGNAL symbol and data symbols as complex baseband
    ///
    /// # Panics
    /// If `rate_index` is not 0-7 or `payload` is longer than 4095 octets.
    #[instrument(level = "debug", skip(self, payload), fields(len = payload.len()))]
    pub fn encode(&self, payload: &[u8], rate_index: usize) -> Vec<Complex64> {
        assert!(rate_index < self.rates.len(), "rate index {} out of range", rate_index);
        assert!(
            payload.len() <= MAX_LENGTH,
            "payload of {} octets exceeds {}",
            payload.len(),
            MAX_LENGTH
        );

        let mut body = bits_from_octets(payload);
        append_fcs(&mut body);
        let mut data = bitvec![u8, Lsb0; 0; SERVICE_BITS];
        data.extend_from_bitslice(&body);

        let header = build_field(&self.rates, rate_index, payload.len());
        let header_grid = self.subcarriers(&header, self.rates.get(HEADER_RATE), HEADER_SEED);
        let data_grid = self.subcarriers(&data, self.rates.get(rate_index), DATA_SEED);
        debug!(data_bits = data.len(), symbols = data_grid.len(), "encoded frame");

        self.format.encode(&header_grid, &data_grid)
    }

    /// Run one bit stream through the coding chain into rows of data subcarriers
    fn subcarriers(&self, bits: &BitSlice<u8, Lsb0>, rate: &Rate, seed: u8) -> Vec<Vec<Complex64>> {
        let scrambled = scramble(bits, Padding::Symbol(rate.data_bits_per_symbol), seed);
        let coded = self.code.encode(&scrambled);
        let punctured: Bits = rate.puncturing_mask().puncture(&coded);
        let interleaved = Interleaver::new(rate.coded_bits_per_symbol, rate.bits_per_subcarrier)
            .apply_bits(&punctured, false);
        rate.constellation()
            .map_bits(&interleaved)
            .chunks(self.format.num_data())
            .map(|row| row.to_vec())
            .collect()
    }
}

/// Encode a frame with the default 20 MHz format
pub fn encode(payload: &[u8], rate_index: usize) -> Vec<Complex64> {
    Transmitter::default().encode(payload, rate_index)
}

/// Number of data OFDM symbols a payload occupies at `rate`
pub fn data_symbols(payload_octets: usize, rate: &Rate) -> usize {
    let bits = SERVICE_BITS + 8 * (payload_octets + 4) + crate::scrambler::TAIL_BITS;
    (bits + rate.data_bits_per_symbol - 1) / rate.data_bits_per_symbol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_length() {
        let tx = Transmitter::default();
        let format = tx.format();
        for (rate_index, len) in [(0, 1), (3, 100), (7, 1500)] {
            let waveform = tx.encode(&vec![0xAB; len], rate_index);
            let symbols = 1 + data_symbols(len, tx.rates().get(rate_index));
            assert_eq!(waveform.len(), format.preamble_len() + symbols * format.symbol_len());
        }
    }

    #[test]
    fn test_empty_payload_encodes() {
        let waveform = encode(&[], 0);
        // 16 + 32 + 6 bits at 24 bits per symbol -> 3 data symbols
        assert_eq!(waveform.len(), 320 + 4 * 80);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_rate_index_out_of_range() {
        encode(b"x", 8);
    }

    #[test]
    #[should_panic(expected = "exceeds")]
    fn test_payload_too_long() {
        encode(&vec![0; MAX_LENGTH + 1], 0);
    }
}
