//! OFDM frame detector
//!
//! Reads an IQ WAV file and prints every frame that decodes with a valid
//! FCS.
//!
//! **Usage**:
//! ```bash
//! cargo run --bin ofdmdetect -- input.wav
//! ```

use rustywifi::tracing_init::init_tracing;
use rustywifi::{wav, Receiver};
use std::env;

fn main() {
    init_tracing();
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.wav>", args[0]);
        eprintln!();
        eprintln!("Decodes OFDM frames from a two-channel float IQ WAV file.");
        std::process::exit(1);
    }

    let (samples, sample_rate) = match wav::read_wav_file(&args[1]) {
        Ok(read) => read,
        Err(e) => {
            eprintln!("Error reading WAV: {}", e);
            std::process::exit(1);
        }
    };

    let receiver = Receiver::default();
    let expected = receiver.format().fs.round() as u32;
    if sample_rate != expected {
        eprintln!("Warning: file sample rate {} Hz, receiver expects {} Hz", sample_rate, expected);
    }
    println!("Read {} samples from {}", samples.len(), args[1]);

    let frames = receiver.decode(&samples);
    if frames.is_empty() {
        println!("No frames decoded.");
        return;
    }

    println!("  Start      End   SNR (dB)  Octets  Payload");
    println!("  -----  -------  ---------  ------  -------");
    for frame in &frames {
        println!(
            "  {:5}  {:7}  {:9.1}  {:6}  {}",
            frame.start,
            frame.end,
            frame.snr_db,
            frame.payload.len(),
            String::from_utf8_lossy(&frame.payload)
        );
    }
}
