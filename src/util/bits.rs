//! Bit-stream helpers
//!
//! Every bit stream in the PHY is LSB-first: an octet `0b0000_0001` goes on the
//! air as `1, 0, 0, 0, 0, 0, 0, 0`, and integer header fields are shifted out
//! starting with bit 0. `BitVec<u8, Lsb0>` stores octets in exactly that order,
//! so packing and unpacking payload octets is a plain reinterpretation.

use bitvec::prelude::*;

/// Bit stream type used throughout the crate
pub type Bits = BitVec<u8, Lsb0>;

/// Unpack octets into a bit stream, LSB of each octet first
pub fn bits_from_octets(octets: &[u8]) -> Bits {
    Bits::from_slice(octets)
}

/// Pack a bit stream back into octets
///
/// Returns `None` if the stream is not a whole number of octets.
pub fn octets_from_bits(bits: &BitSlice<u8, Lsb0>) -> Option<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return None;
    }
    Some(
        bits.chunks(8)
            .map(|octet| u8::shift_in(octet))
            .collect(),
    )
}

/// Reverse the order of the low `width` bits of `value`
pub fn reverse_bits(value: u32, width: usize) -> u32 {
    assert!(width <= 32, "width must be <= 32");
    (0..width).fold(0, |acc, i| acc | (((value >> i) & 1) << (width - 1 - i)))
}

/// XOR-fold of all bits of `value` (1 if an odd number of bits are set)
pub fn parity(value: u32) -> u32 {
    value.count_ones() & 1
}

/// Integer fields that can be serialised LSB-first into a bit stream
pub trait ShiftBits: Sized {
    /// Append the low `width` bits of `self`, bit 0 first
    fn shift_out(&self, bits: &mut Bits, width: usize);

    /// Read an integer from a bit slice whose first element is bit 0
    fn shift_in(bits: &BitSlice<u8, Lsb0>) -> Self;
}

macro_rules! impl_shift_bits {
    ($($t:ty),*) => {
        $(
            impl ShiftBits for $t {
                fn shift_out(&self, bits: &mut Bits, width: usize) {
                    assert!(width <= <$t>::BITS as usize, "width exceeds the bit size of the type");
                    for i in 0..width {
                        bits.push((*self >> i) & 1 != 0);
                    }
                }

                fn shift_in(bits: &BitSlice<u8, Lsb0>) -> Self {
                    assert!(bits.len() <= <$t>::BITS as usize, "BitSlice longer than the type");
                    bits.iter()
                        .enumerate()
                        .fold(0, |acc, (i, bit)| acc | ((*bit as $t) << i))
                }
            }
        )*
    };
}

impl_shift_bits!(u8, u16, u32);
