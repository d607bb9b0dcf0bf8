pub mod ffmpeg;
pub mod wav;

pub use ffmpeg::{check_ffmpeg, check_ffprobe, FfmpegDecoder, FfmpegEncoder};
pub use wav::WavDecoder;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::audio::PcmBuffer;
use crate::clip::TimeInterval;
use crate::error::Result;

/// Receives raw diagnostic lines from an encoder subprocess, tagged with the
/// input file they belong to.
pub type LogSink = Arc<dyn Fn(&Path, &str) + Send + Sync>;

/// Decodes a media file's audio track into PCM samples.
///
/// The subprocess-backed adapter lives in [`ffmpeg`]; tests substitute
/// in-memory implementations so pipeline logic runs without media tools.
#[async_trait]
pub trait Decoder: Send + Sync {
    /// Total duration of the media file.
    async fn probe_duration(&self, input: &Path) -> Result<Duration>;

    /// Decode the full audio track into mono 16-bit PCM.
    async fn decode_pcm(&self, input: &Path) -> Result<PcmBuffer>;
}

/// Writes trimmed clips back out to a container.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Extract the sub-clip covering `interval` from `input` into `output`.
    async fn extract_clip(&self, input: &Path, output: &Path, interval: TimeInterval)
        -> Result<()>;

    /// Concatenate `parts`, in order, into a single `output` clip.
    async fn concat_clips(&self, parts: &[PathBuf], output: &Path) -> Result<()>;
}
