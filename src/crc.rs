//! Frame-check sequence
//!
//! The FCS is the IEEE CRC-32 (reflected polynomial 0x04C11DB7, init and
//! final XOR 0xFFFFFFFF) computed over the payload octets. It is appended as
//! four little-endian octets, which with LSB-first bit order puts the
//! coefficient of x^31 on the air first.

use bitvec::prelude::*;
use crc::{Crc, CRC_32_ISO_HDLC};

use crate::util::{bits_from_octets, octets_from_bits, Bits, ShiftBits};

/// FCS length in bits
pub const FCS_BITS: usize = 32;

/// FCS CRC instance
const FCS_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Calculate the CRC-32 of a sequence of octets
///
/// # Example
/// ```
/// use rustywifi::crc::crc32;
///
/// assert_eq!(crc32(b"123456789"), 0xCBF43926);
/// ```
pub fn crc32(octets: &[u8]) -> u32 {
    FCS_CRC.checksum(octets)
}

/// Append the FCS of `bits` to the end of the stream
///
/// # Panics
/// If `bits` does not hold a whole number of octets.
pub fn append_fcs(bits: &mut Bits) {
    assert!(bits.len() % 8 == 0, "FCS input must be octet aligned");
    let octets: Vec<u8> = bits.chunks(8).map(u8::shift_in).collect();
    bits.extend_from_bitslice(&bits_from_octets(&crc32(&octets).to_le_bytes()));
}

/// Check the trailing 32-bit FCS of a bit stream
///
/// Streams that are not octet aligned or too short to carry an FCS fail the
/// check.
pub fn check_fcs(bits: &BitSlice<u8, Lsb0>) -> bool {
    if bits.len() < FCS_BITS {
        return false;
    }
    let Some(octets) = octets_from_bits(bits) else {
        return false;
    };
    let (body, fcs) = octets.split_at(octets.len() - 4);
    crc32(body).to_le_bytes() == fcs
}
