//! Modulation and coding rates
//!
//! Eight fixed descriptors, addressed by index 0-7 or by the 4-bit code sent
//! in the SIGNAL field.

use crate::fec::PuncturingMask;
use crate::ofdm::OfdmFormat;
use crate::qam::{constellation, Constellation};

/// (SIGNAL code, bits per subcarrier, code rate) for indices 0-7
const RATES: [(u8, usize, (usize, usize)); 8] = [
    (0xD, 1, (1, 2)),
    (0xF, 2, (1, 2)),
    (0x5, 2, (3, 4)),
    (0x7, 4, (1, 2)),
    (0x9, 4, (3, 4)),
    (0xB, 6, (2, 3)),
    (0x1, 6, (3, 4)),
    (0x3, 6, (5, 6)),
];

/// One modulation and coding rate
#[derive(Debug, Clone)]
pub struct Rate {
    /// 4-bit SIGNAL field code
    pub code: u8,
    /// Coded bits carried by each data subcarrier
    pub bits_per_subcarrier: usize,
    /// Code rate as (k, n)
    pub puncturing: (usize, usize),
    /// Coded bits per OFDM symbol
    pub coded_bits_per_symbol: usize,
    /// Data bits per OFDM symbol
    pub data_bits_per_symbol: usize,
}

impl Rate {
    pub fn puncturing_mask(&self) -> PuncturingMask {
        PuncturingMask::new(self.puncturing.0, self.puncturing.1)
    }

    pub fn constellation(&self) -> &'static Constellation {
        constellation(self.bits_per_subcarrier)
    }
}

/// Table of the supported rates
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: Vec<Rate>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::new(&OfdmFormat::default())
    }
}

impl RateTable {
    /// Build the table for the number of data subcarriers in `format`
    pub fn new(format: &OfdmFormat) -> Self {
        let rates = RATES
            .iter()
            .map(|&(code, bits_per_subcarrier, (k, n))| {
                let coded_bits_per_symbol = format.num_data() * bits_per_subcarrier;
                Rate {
                    code,
                    bits_per_subcarrier,
                    puncturing: (k, n),
                    coded_bits_per_symbol,
                    data_bits_per_symbol: coded_bits_per_symbol * k / n,
                }
            })
            .collect();
        Self { rates }
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Rate at `index`
    ///
    /// # Panics
    /// If `index` is 8 or more.
    pub fn get(&self, index: usize) -> &Rate {
        assert!(index < self.rates.len(), "rate index {} out of range", index);
        &self.rates[index]
    }

    /// Index of the rate sent with SIGNAL code `code`
    pub fn by_code(&self, code: u8) -> Option<usize> {
        self.rates.iter().position(|rate| rate.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rate> {
        self.rates.iter()
    }
}
