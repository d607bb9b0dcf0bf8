pub mod profile;
pub mod select;

pub use profile::compute_loudness_profile;
pub use select::{drop_threshold, select_drop_intervals};

use std::time::Duration;

/// Mono 16-bit PCM decoded from a media file's audio track.
///
/// Immutable once produced; the profiler consumes it and the buffer is
/// dropped with the pipeline invocation that created it.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmBuffer {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            channels: 1,
        }
    }

    /// Duration covered by the sample sequence.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// Loudness of one fixed-size chunk of the sample sequence.
///
/// `loudness_db` is `f64::NEG_INFINITY` for a chunk of digital silence.
#[derive(Debug, Clone, Copy)]
pub struct ChunkLoudness {
    pub index: usize,
    /// Chunk start on the original timeline, in seconds.
    pub start_secs: f64,
    pub loudness_db: f64,
}

impl ChunkLoudness {
    pub fn is_silent(&self) -> bool {
        self.loudness_db == f64::NEG_INFINITY
    }
}

/// Per-chunk loudness values in time order, one entry per chunk.
#[derive(Debug, Clone)]
pub struct LoudnessProfile {
    pub chunks: Vec<ChunkLoudness>,
    pub chunk_size: usize,
    pub sample_rate: u32,
}

impl LoudnessProfile {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Width of one chunk on the timeline, in seconds.
    pub fn chunk_secs(&self) -> f64 {
        self.chunk_size as f64 / self.sample_rate as f64
    }
}
