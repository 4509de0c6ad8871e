//! SIGNAL field codec
//!
//! 18 bits, LSB first: rate code bit-reversed into bits 0-3, a reserved zero
//! at bit 4, the 12-bit length at bits 5-16 and even parity over bits 0-16 at
//! bit 17. The encoder tail that completes the 24-bit field is added by the
//! scrambler.
//!
//! LENGTH counts payload octets only. The 4-octet FCS is not included, unlike
//! IEEE 802.11 where LENGTH covers the whole PSDU. Frames from this crate
//! therefore do not interoperate with standard 802.11a transmitters or
//! receivers: each side would read the other's LENGTH as 4 octets off.

use bitvec::prelude::*;
use snafu::{OptionExt, Snafu};

use crate::rate::RateTable;
use crate::util::{parity, reverse_bits, Bits, ShiftBits};

/// Bits in the SIGNAL field before the encoder tail
pub const FIELD_BITS: usize = 18;

/// Largest value the length field can carry
pub const MAX_LENGTH: usize = 0xFFF;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum PlcpError {
    /// Parity bit does not match bits 0-16
    #[snafu(display("SIGNAL field parity check failed"))]
    Parity,

    /// Rate code with no entry in the rate table
    #[snafu(display("unknown rate code {:#x}", code))]
    UnknownRate { code: u8 },

    /// Fewer than 18 bits supplied
    #[snafu(display("SIGNAL field truncated to {} bits", len))]
    Truncated { len: usize },
}

/// Decoded SIGNAL field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlcpHeader {
    pub rate_index: usize,
    pub length_octets: usize,
}

/// Serialise the SIGNAL field for `rate_index` and `length_octets`
///
/// # Panics
/// If `length_octets` does not fit in 12 bits or the rate index is invalid.
pub fn build_field(rates: &RateTable, rate_index: usize, length_octets: usize) -> Bits {
    assert!(length_octets <= MAX_LENGTH, "length {} exceeds the 12-bit field", length_octets);
    let code = rates.get(rate_index).code as u32;
    let mut field = reverse_bits(code, 4) | ((length_octets as u32) << 5);
    field |= parity(field) << 17;

    let mut bits = Bits::with_capacity(FIELD_BITS);
    field.shift_out(&mut bits, FIELD_BITS);
    bits
}

/// Parse the first 18 bits of `bits` as a SIGNAL field
pub fn parse_field(rates: &RateTable, bits: &BitSlice<u8, Lsb0>) -> Result<PlcpHeader, PlcpError> {
    if bits.len() < FIELD_BITS {
        return TruncatedSnafu { len: bits.len() }.fail();
    }
    let field = u32::shift_in(&bits[..FIELD_BITS]);
    if parity(field) != 0 {
        return ParitySnafu.fail();
    }

    let code = reverse_bits(field & 0xF, 4) as u8;
    let rate_index = rates.by_code(code).context(UnknownRateSnafu { code })?;
    Ok(PlcpHeader {
        rate_index,
        length_octets: ((field >> 5) & 0xFFF) as usize,
    })
}
