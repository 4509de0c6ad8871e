pub mod util;
pub mod crc;
pub mod scrambler;
pub mod interleaver;
pub mod qam;
pub mod fec;
pub mod ofdm;
pub mod rate;
pub mod plcp;
pub mod transmit;
pub mod sync;
pub mod training;
pub mod linalg;
pub mod kalman;
pub mod demod;
pub mod decoder;
pub mod simulation;
pub mod wav;
pub mod tracing_init;

pub use transmit::{encode, Transmitter};
pub use decoder::{decode, DecodedFrame, DecoderConfig, Receiver};
