//! OFDM framing
//!
//! Format constants for the 20 MHz 802.11a layout, the short and long training
//! sequences, the pilot layout, and assembly of a complete time-domain frame
//! from header and data subcarrier grids.
//!
//! Subcarriers are addressed by signed index (-32..32); [`OfdmFormat::bin`]
//! maps them onto FFT bins.

mod fft;

pub use fft::SymbolFft;

use crate::qam::Complex64;
use crate::scrambler;

/// Short training sequence tones (subcarrier, (re, im)) before scaling
const STS_TONES: [(i32, (f64, f64)); 12] = [
    (-24, (1.0, 1.0)),
    (-20, (-1.0, -1.0)),
    (-16, (1.0, 1.0)),
    (-12, (-1.0, -1.0)),
    (-8, (-1.0, -1.0)),
    (-4, (1.0, 1.0)),
    (4, (-1.0, -1.0)),
    (8, (-1.0, -1.0)),
    (12, (1.0, 1.0)),
    (16, (1.0, 1.0)),
    (20, (1.0, 1.0)),
    (24, (1.0, 1.0)),
];

/// Long training sequence for subcarriers -26..=26
const LTS_TONES: [i8; 53] = [
    1, 1, -1, -1, 1, 1, -1, 1, -1, 1, 1, 1, 1, 1, 1, -1, -1, 1, 1, -1, 1, -1, 1, 1, 1, 1,
    0,
    1, -1, -1, 1, 1, -1, 1, -1, 1, -1, -1, -1, -1, -1, 1, 1, -1, -1, 1, -1, 1, -1, 1, 1, 1, 1,
];

/// Frame layout and reference sequences
#[derive(Debug, Clone)]
pub struct OfdmFormat {
    /// FFT size
    pub nfft: usize,
    /// Cyclic prefix length per symbol
    pub ncp: usize,
    /// Sample rate in Hz
    pub fs: f64,
    /// Repetitions of the long training symbol
    pub ts_reps: usize,
    /// Data subcarriers in the order grid columns are placed
    pub data_subcarriers: Vec<i32>,
    /// Pilot subcarriers
    pub pilot_subcarriers: Vec<i32>,
    /// Reference pilot values, one per pilot subcarrier
    pub pilot_template: Vec<f64>,
    /// Short training spectrum, indexed by FFT bin
    pub sts_freq: Vec<Complex64>,
    /// Long training spectrum, indexed by FFT bin
    pub lts_freq: Vec<Complex64>,
    /// Cyclic pilot polarity sequence, one entry per symbol
    pub pilot_polarity: Vec<f64>,
}

impl Default for OfdmFormat {
    fn default() -> Self {
        let nfft = 64;
        let pilot_subcarriers = vec![-21, -7, 7, 21];
        let data_subcarriers: Vec<i32> = (-26..=26)
            .filter(|k| *k != 0 && !pilot_subcarriers.contains(k))
            .collect();

        let mut format = Self {
            nfft,
            ncp: 16,
            fs: 20e6,
            ts_reps: 2,
            data_subcarriers,
            pilot_subcarriers,
            pilot_template: vec![1.0, 1.0, 1.0, -1.0],
            sts_freq: vec![Complex64::new(0.0, 0.0); nfft],
            lts_freq: vec![Complex64::new(0.0, 0.0); nfft],
            pilot_polarity: scrambler::pilot_polarity(),
        };

        let sts_scale = (13.0f64 / 6.0).sqrt();
        for &(k, (re, im)) in STS_TONES.iter() {
            let bin = format.bin(k);
            format.sts_freq[bin] = Complex64::new(re, im) * sts_scale;
        }
        for (k, &value) in (-26..=26).zip(LTS_TONES.iter()) {
            let bin = format.bin(k);
            format.lts_freq[bin] = Complex64::new(value as f64, 0.0);
        }
        format
    }
}

impl OfdmFormat {
    /// FFT bin for a signed subcarrier index
    pub fn bin(&self, subcarrier: i32) -> usize {
        subcarrier.rem_euclid(self.nfft as i32) as usize
    }

    pub fn data_bins(&self) -> Vec<usize> {
        self.data_subcarriers.iter().map(|&k| self.bin(k)).collect()
    }

    pub fn pilot_bins(&self) -> Vec<usize> {
        self.pilot_subcarriers.iter().map(|&k| self.bin(k)).collect()
    }

    /// Subcarriers carrying data
    pub fn num_data(&self) -> usize {
        self.data_subcarriers.len()
    }

    /// Subcarriers carrying data or pilots
    pub fn num_used(&self) -> usize {
        self.data_subcarriers.len() + self.pilot_subcarriers.len()
    }

    /// Samples per OFDM symbol including the cyclic prefix
    pub fn symbol_len(&self) -> usize {
        self.nfft + self.ncp
    }

    /// Repetition period of the short training sequence
    pub fn sts_period(&self) -> usize {
        self.nfft / 4
    }

    /// Length of the short training section
    pub fn sts_len(&self) -> usize {
        self.ts_reps * self.symbol_len()
    }

    /// Cyclic prefix in front of the long training symbols
    pub fn lts_cp(&self) -> usize {
        self.ts_reps * self.ncp
    }

    /// Length of the long training section including its prefix
    pub fn lts_len(&self) -> usize {
        self.lts_cp() + self.ts_reps * self.nfft
    }

    pub fn preamble_len(&self) -> usize {
        self.sts_len() + self.lts_len()
    }

    /// Pilot polarity for symbol `index` (the header is symbol 0)
    pub fn polarity(&self, index: usize) -> f64 {
        self.pilot_polarity[index % self.pilot_polarity.len()]
    }

    /// Scale applied after the inverse FFT for unit average power
    fn time_scale(&self) -> f64 {
        1.0 / (self.num_used() as f64).sqrt()
    }

    /// Short and long training sequences in the time domain
    pub fn preamble(&self, fft: &SymbolFft) -> Vec<Complex64> {
        let scale = self.time_scale();
        let sts = fft.inverse(&self.sts_freq);
        let lts = fft.inverse(&self.lts_freq);

        let mut preamble = Vec::with_capacity(self.preamble_len());
        preamble.extend((0..self.sts_len()).map(|n| sts[n % self.nfft] * scale));
        // the long training prefix is the tail of the symbol
        let shift = self.nfft - self.lts_cp() % self.nfft;
        preamble.extend((0..self.lts_len()).map(|n| lts[(n + shift) % self.nfft] * scale));
        preamble
    }

    /// One OFDM symbol with cyclic prefix from its data subcarrier values
    fn symbol(&self, fft: &SymbolFft, data: &[Complex64], index: usize) -> Vec<Complex64> {
        let mut bins = vec![Complex64::new(0.0, 0.0); self.nfft];
        for (bin, &value) in self.data_bins().into_iter().zip(data.iter()) {
            bins[bin] = value;
        }
        let polarity = self.polarity(index);
        for (bin, &pilot) in self.pilot_bins().into_iter().zip(self.pilot_template.iter()) {
            bins[bin] = Complex64::new(pilot * polarity, 0.0);
        }

        let scale = self.time_scale();
        let time = fft.inverse(&bins);
        (self.nfft - self.ncp..self.nfft)
            .chain(0..self.nfft)
            .map(|n| time[n] * scale)
            .collect()
    }

    /// Assemble preamble, header symbol and data symbols into a waveform
    ///
    /// Each grid row holds [`OfdmFormat::num_data`] subcarrier values. Pilot
    /// polarity counts the header as symbol 0.
    pub fn encode(&self, header: &[Vec<Complex64>], data: &[Vec<Complex64>]) -> Vec<Complex64> {
        let fft = SymbolFft::new(self.nfft);
        let mut waveform = self.preamble(&fft);
        waveform.reserve((header.len() + data.len()) * self.symbol_len());
        for (index, row) in header.iter().chain(data.iter()).enumerate() {
            waveform.extend(self.symbol(&fft, row, index));
        }
        waveform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let format = OfdmFormat::default();
        assert_eq!(format.num_data(), 48);
        assert_eq!(format.num_used(), 52);
        assert_eq!(format.preamble_len(), 320);
        assert_eq!(format.sts_len(), 160);
        assert_eq!(format.bin(-1), 63);
        assert_eq!(format.bin(26), 26);
        assert_eq!(format.lts_freq.iter().filter(|v| v.norm() > 0.0).count(), 52);
        assert_eq!(format.lts_freq[0], Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_short_training_repeats() {
        let format = OfdmFormat::default();
        let preamble = format.preamble(&SymbolFft::new(format.nfft));
        let p = format.sts_period();
        for n in 0..format.sts_len() - p {
            assert!((preamble[n] - preamble[n + p]).norm() < 1e-12);
        }
    }

    #[test]
    fn test_long_training_cyclic_prefix() {
        let format = OfdmFormat::default();
        let preamble = format.preamble(&SymbolFft::new(format.nfft));
        let lts = &preamble[format.sts_len()..];
        let cp = format.lts_cp();
        // prefix is the tail of the symbol, and both symbols are identical
        for n in 0..cp {
            assert!((lts[n] - lts[n + format.nfft]).norm() < 1e-12);
        }
        for n in 0..format.nfft {
            assert!((lts[cp + n] - lts[cp + format.nfft + n]).norm() < 1e-12);
        }
    }

    #[test]
    fn test_unit_power_symbols() {
        let format = OfdmFormat::default();
        let row = vec![Complex64::new(1.0, 0.0); format.num_data()];
        let waveform = format.encode(&[row.clone()], &[row]);
        assert_eq!(waveform.len(), format.preamble_len() + 2 * format.symbol_len());
        let body = &waveform[format.preamble_len() + format.ncp..format.preamble_len() + format.symbol_len()];
        let power = body.iter().map(|s| s.norm_sqr()).sum::<f64>() / body.len() as f64;
        assert!((power - 1.0).abs() < 1e-9);
    }
}
