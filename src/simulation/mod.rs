//! Channel simulation for testing and the simulator binary
//!
//! Impairs a transmitted waveform the way a real link would: leading and
//! trailing silence, a carrier frequency offset, and additive white Gaussian
//! noise at a chosen SNR.

mod channel;

pub use channel::{add_awgn, apply_cfo, pad, Channel};
