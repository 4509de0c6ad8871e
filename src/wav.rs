//! IQ WAV files
//!
//! Complex baseband is stored as two-channel 32-bit float WAV: in-phase on
//! the left channel, quadrature on the right. The sample rate is the OFDM
//! sample rate rounded to whole hertz.

use std::io::{Read, Seek, Write};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use snafu::{ensure, ResultExt, Snafu};

use crate::qam::Complex64;

#[derive(Debug, Snafu)]
pub enum WavError {
    #[snafu(display("WAV I/O failed: {}", source))]
    Hound { source: hound::Error },

    #[snafu(display("expected 2 channels of 32-bit float, got {} channels of {:?} {}-bit", channels, format, bits))]
    Layout {
        channels: u16,
        format: SampleFormat,
        bits: u16,
    },
}

fn spec(sample_rate: f64) -> WavSpec {
    WavSpec {
        channels: 2,
        sample_rate: sample_rate.round() as u32,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Write `samples` as IQ to any seekable sink
pub fn write_iq<W: Write + Seek>(sink: W, samples: &[Complex64], sample_rate: f64) -> Result<(), WavError> {
    let mut writer = WavWriter::new(sink, spec(sample_rate)).context(HoundSnafu)?;
    for sample in samples {
        writer.write_sample(sample.re as f32).context(HoundSnafu)?;
        writer.write_sample(sample.im as f32).context(HoundSnafu)?;
    }
    writer.finalize().context(HoundSnafu)
}

/// Read IQ samples and the sample rate from any source
pub fn read_iq<R: Read>(source: R) -> Result<(Vec<Complex64>, u32), WavError> {
    let reader = WavReader::new(source).context(HoundSnafu)?;
    let spec = reader.spec();
    ensure!(
        spec.channels == 2 && spec.sample_format == SampleFormat::Float && spec.bits_per_sample == 32,
        LayoutSnafu {
            channels: spec.channels,
            format: spec.sample_format,
            bits: spec.bits_per_sample
        }
    );

    let interleaved: Vec<f32> = reader
        .into_samples::<f32>()
        .collect::<Result<_, _>>()
        .context(HoundSnafu)?;
    let samples = interleaved
        .chunks_exact(2)
        .map(|pair| Complex64::new(pair[0] as f64, pair[1] as f64))
        .collect();
    Ok((samples, spec.sample_rate))
}

pub fn write_wav_file(path: &str, samples: &[Complex64], sample_rate: f64) -> Result<(), WavError> {
    let file = std::fs::File::create(path)
        .map_err(hound::Error::from)
        .context(HoundSnafu)?;
    write_iq(std::io::BufWriter::new(file), samples, sample_rate)
}

pub fn read_wav_file(path: &str) -> Result<(Vec<Complex64>, u32), WavError> {
    let file = std::fs::File::open(path)
        .map_err(hound::Error::from)
        .context(HoundSnafu)?;
    read_iq(std::io::BufReader::new(file))
}
