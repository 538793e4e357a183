//! Signal file I/O
//!
//! Mono signals in and out of WAV (via `hound`) and one-value-per-line text
//! files. Only used by offline tooling; nothing here runs on the audio thread.

use std::fs;
use std::io::Write;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};

use crate::error::{ConvError, Result};

/// A mono signal with its sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct MonoSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Read the first channel of a WAV file as `f32` samples in [-1, 1]
pub fn read_wav_mono(path: &Path) -> Result<MonoSignal> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    debug!(
        "{}: {} channels, {} Hz, {}-bit {:?}",
        path.display(),
        spec.channels,
        spec.sample_rate,
        spec.bits_per_sample,
        spec.sample_format
    );

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = match spec.bits_per_sample {
                8 => 128.0,
                16 => 32768.0,
                24 => 8388608.0,
                32 => 2147483648.0,
                bits => {
                    return Err(ConvError::UnsupportedFormat {
                        format: format!("{}-bit integer audio", bits),
                    })
                }
            };
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let samples = interleaved.into_iter().step_by(channels).collect();
    Ok(MonoSignal {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Write a mono 32-bit float WAV file
pub fn write_wav_mono(path: &Path, signal: &MonoSignal) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: signal.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in &signal.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    info!("Wrote {} samples to {}", signal.samples.len(), path.display());
    Ok(())
}

/// Read one value per line; blank lines are skipped
pub fn read_text_signal(path: &Path) -> Result<Vec<f64>> {
    let content = fs::read_to_string(path)?;
    parse_text_signal(&content)
}

/// Parse one value per line; blank lines are skipped
pub fn parse_text_signal(content: &str) -> Result<Vec<f64>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.trim()
                .parse::<f64>()
                .map_err(|e| ConvError::SignalFormat {
                    line: i + 1,
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Write one value per line
pub fn write_text_signal<W: Write>(mut out: W, samples: &[f64]) -> Result<()> {
    for sample in samples {
        writeln!(out, "{:e}", sample)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_text_signal() {
        let values = parse_text_signal("1.0\n\n-2.5e-1\n  3 \n").unwrap();
        assert_eq!(values, vec![1.0, -0.25, 3.0]);
    }

    #[test]
    fn test_parse_text_signal_reports_line() {
        let err = parse_text_signal("1.0\nabc\n").unwrap_err();
        match err {
            ConvError::SignalFormat { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_text_signal() {
        let mut out = Vec::new();
        write_text_signal(&mut out, &[0.5, -1.0]).unwrap();
        let parsed = parse_text_signal(std::str::from_utf8(&out).unwrap()).unwrap();
        assert_eq!(parsed, vec![0.5, -1.0]);
    }

    #[test]
    fn test_wav_mono_first_channel() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for i in 0..4i16 {
            writer.write_sample(i * 8192).unwrap();
            writer.write_sample(-1i16).unwrap();
        }
        writer.finalize().unwrap();

        let signal = read_wav_mono(&path).unwrap();
        assert_eq!(signal.sample_rate, 48000);
        assert_eq!(signal.samples, vec![0.0, 0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_wav_float_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let signal = MonoSignal {
            samples: vec![0.1, -0.2, 0.3],
            sample_rate: 44100,
        };
        write_wav_mono(&path, &signal).unwrap();
        assert_eq!(read_wav_mono(&path).unwrap(), signal);
    }
}
