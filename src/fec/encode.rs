//! Rate-1/2 convolutional encoder

use bitvec::prelude::*;

use super::ConvolutionalCode;
use crate::util::Bits;

pub fn encode(code: &ConvolutionalCode, bits: &BitSlice<u8, Lsb0>) -> Bits {
    let register_mask = (1 << code.constraint_length) - 1;
    let mut register = 0usize;
    let mut coded = Bits::with_capacity(2 * bits.len());

    for bit in bits.iter().by_vals() {
        register = ((register << 1) | bit as usize) & register_mask;
        let [a, b] = code.outputs(register);
        coded.push(a);
        coded.push(b);
    }
    coded
}
