pub mod bits;

pub use bits::{bits_from_octets, octets_from_bits, parity, reverse_bits, Bits, ShiftBits};
