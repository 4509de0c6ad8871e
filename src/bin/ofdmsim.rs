//! OFDM frame simulator
//!
//! Encodes a text payload into one frame and writes it to an IQ WAV file
//! after passing it through a simulated channel.
//!
//! Usage:
//!   ofdmsim [OPTIONS] <payload> <output.wav>
//!
//! Options:
//!   -r, --rate <index>    Rate index 0-7 (default: 0)
//!   -s, --snr <dB>        Add AWGN at this SNR (default: no noise)
//!   -c, --cfo <Hz>        Carrier frequency offset (default: 0)
//!   -d, --delay <n>       Leading silence in samples (default: 400)
//!       --seed <n>        Noise seed (default: 0)
//!   -h, --help            Show this help message
//!
//! Examples:
//!   ofdmsim "hello" clean.wav
//!   ofdmsim -r 5 -s 20 -c 30000 "hello" impaired.wav

use rustywifi::simulation::Channel;
use rustywifi::tracing_init::init_tracing;
use rustywifi::{wav, Transmitter};

/// Trailing silence so the receiver has room past the last symbol
const TRAILING: usize = 400;

struct SimConfig {
    payload: String,
    output_path: String,
    rate: usize,
    channel: Channel,
}

fn value<'a>(args: &'a [String], i: usize, name: &str) -> Result<&'a str, String> {
    args.get(i)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing value for {}", name))
}

impl SimConfig {
    fn parse_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();

        let mut rate = 0;
        let mut channel = Channel {
            delay: 400,
            trailing: TRAILING,
            ..Channel::default()
        };
        let mut payload = None;
        let mut output_path = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-r" | "--rate" => {
                    i += 1;
                    let text = value(&args, i, "--rate")?;
                    rate = text.parse().map_err(|_| format!("Invalid rate index: {}", text))?;
                }
                "-s" | "--snr" => {
                    i += 1;
                    let text = value(&args, i, "--snr")?;
                    channel.snr_db = Some(text.parse().map_err(|_| format!("Invalid SNR value: {}", text))?);
                }
                "-c" | "--cfo" => {
                    i += 1;
                    let text = value(&args, i, "--cfo")?;
                    channel.cfo_hz = text.parse().map_err(|_| format!("Invalid CFO value: {}", text))?;
                }
                "-d" | "--delay" => {
                    i += 1;
                    let text = value(&args, i, "--delay")?;
                    channel.delay = text.parse().map_err(|_| format!("Invalid delay value: {}", text))?;
                }
                "--seed" => {
                    i += 1;
                    let text = value(&args, i, "--seed")?;
                    channel.seed = text.parse().map_err(|_| format!("Invalid seed: {}", text))?;
                }
                "-h" | "--help" => {
                    print_help(&args[0]);
                    std::process::exit(0);
                }
                arg if !arg.starts_with('-') => {
                    if payload.is_none() {
                        payload = Some(arg.to_string());
                    } else if output_path.is_none() {
                        output_path = Some(arg.to_string());
                    } else {
                        return Err(format!("Unexpected argument: {}", arg));
                    }
                }
                arg => return Err(format!("Unknown option: {}", arg)),
            }
            i += 1;
        }

        Ok(SimConfig {
            payload: payload.ok_or("Missing payload argument")?,
            output_path: output_path.ok_or("Missing output file argument")?,
            rate,
            channel,
        })
    }
}

fn print_help(program: &str) {
    eprintln!("OFDM Frame Simulator");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <payload> <output.wav>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -r, --rate <index>    Rate index 0-7 (default: 0)");
    eprintln!("  -s, --snr <dB>        Add AWGN at this SNR (default: no noise)");
    eprintln!("  -c, --cfo <Hz>        Carrier frequency offset (default: 0)");
    eprintln!("  -d, --delay <n>       Leading silence in samples (default: 400)");
    eprintln!("      --seed <n>        Noise seed (default: 0)");
    eprintln!("  -h, --help            Show this help message");
}

fn main() -> Result<(), String> {
    init_tracing();
    let config = SimConfig::parse_args()?;

    let tx = Transmitter::default();
    if config.rate >= tx.rates().len() {
        return Err(format!("Rate index must be below {}", tx.rates().len()));
    }
    let payload = config.payload.as_bytes();
    if payload.len() > rustywifi::plcp::MAX_LENGTH {
        return Err(format!("Payload longer than {} octets", rustywifi::plcp::MAX_LENGTH));
    }

    let rate = tx.rates().get(config.rate);
    println!("OFDM Frame Simulator");
    println!("====================");
    println!("Payload:      {} octets", payload.len());
    println!("Rate:         {} ({} data bits/symbol)", config.rate, rate.data_bits_per_symbol);
    match config.channel.snr_db {
        Some(snr) => println!("SNR:          {:.1} dB", snr),
        None => println!("SNR:          noiseless"),
    }
    println!("CFO:          {:.1} Hz", config.channel.cfo_hz);
    println!("Delay:        {} samples", config.channel.delay);
    println!();

    let fs = tx.format().fs;
    let waveform = tx.encode(payload, config.rate);
    let samples = config.channel.apply(&waveform, fs);

    wav::write_wav_file(&config.output_path, &samples, fs).map_err(|e| e.to_string())?;
    println!("Wrote {} samples ({:.1} us) to {}", samples.len(), samples.len() as f64 / fs * 1e6, config.output_path);

    Ok(())
}
