use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use hound::WavReader;
use tracing::debug;

use super::Decoder;
use crate::audio::PcmBuffer;
use crate::error::{QuietcutError, Result};

/// Decoder for audio that is already a WAV file; no subprocess involved.
///
/// Useful for pre-extracted audio and for exercising the pipeline in tests.
/// Samples are downmixed to mono by channel averaging; the buffer keeps the
/// file's native sample rate.
pub struct WavDecoder;

#[async_trait]
impl Decoder for WavDecoder {
    async fn probe_duration(&self, input: &Path) -> Result<Duration> {
        let reader = open(input)?;
        let spec = reader.spec();
        let frames = reader.duration();
        Ok(Duration::from_secs_f64(
            frames as f64 / spec.sample_rate as f64,
        ))
    }

    async fn decode_pcm(&self, input: &Path) -> Result<PcmBuffer> {
        let reader = open(input)?;
        let spec = reader.spec();

        debug!(
            sample_rate = spec.sample_rate,
            channels = spec.channels,
            bits = spec.bits_per_sample,
            "Reading WAV"
        );

        let samples: Vec<i16> = match spec.sample_format {
            hound::SampleFormat::Int => reader
                .into_samples::<i16>()
                .map(|s| s.unwrap_or(0))
                .collect(),
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| (s.unwrap_or(0.0) * i16::MAX as f32) as i16)
                .collect(),
        };

        let mono = downmix(samples, spec.channels);
        Ok(PcmBuffer::new(mono, spec.sample_rate))
    }
}

fn open(input: &Path) -> Result<WavReader<std::io::BufReader<std::fs::File>>> {
    if !input.exists() {
        return Err(QuietcutError::FileNotFound(input.display().to_string()));
    }
    WavReader::open(input)
        .map_err(|e| QuietcutError::MediaDecode(format!("Failed to open WAV file: {e}")))
}

/// Average interleaved frames down to a single channel.
fn downmix(samples: Vec<i16>, channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples;
    }

    samples
        .chunks(channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}
