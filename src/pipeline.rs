use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

use crate::audio::{compute_loudness_profile, select_drop_intervals};
use crate::clip::{assemble_clip, plan_keep_intervals};
use crate::config::{DEFAULT_CHUNK_SIZE, DEFAULT_VOLUME_PERCENTAGE};
use crate::error::{QuietcutError, Result};
use crate::media::{Decoder, Encoder};

/// Knobs for a single file's trim pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Threshold knob in `[0, 10]`.
    pub volume_percentage: f64,
    /// Samples per loudness chunk.
    pub chunk_size: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            volume_percentage: DEFAULT_VOLUME_PERCENTAGE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Why a pipeline ended without writing an output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No chunk fell below the threshold; the input needs no trimming.
    NoTrimNeeded,
    /// Every chunk fell below the threshold; nothing would remain.
    FullySilent,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoTrimNeeded => write!(f, "volume is normal, no trimming needed"),
            SkipReason::FullySilent => write!(f, "entire file is below the threshold"),
        }
    }
}

/// Terminal result of one file's pipeline.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    /// Output written.
    Trimmed {
        output: PathBuf,
        kept_secs: f64,
        removed_secs: f64,
    },
    Skipped(SkipReason),
}

/// Timing and volume figures from one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub decode_time: Duration,
    pub assemble_time: Duration,
    pub total_time: Duration,
    pub media_duration: Duration,
    pub total_chunks: usize,
    pub dropped_chunks: usize,
}

#[derive(Debug)]
pub struct FileReport {
    pub input: PathBuf,
    pub outcome: FileOutcome,
    pub stats: PipelineStats,
}

/// Output path for an input: same base name, extension normalized to `.mp4`,
/// in the output folder. Collisions between distinct inputs with the same
/// stem are the caller's responsibility.
pub fn derive_output_path(input: &Path, output_dir: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default();
    output_dir.join(format!("{}.mp4", stem.to_string_lossy()))
}

/// Run the trim pipeline for one file: decode → profile → select → plan →
/// assemble.
///
/// Stages run strictly in order. The cancellation token is checked at stage
/// boundaries (before decoding, before assembly, and inside
/// [`assemble_clip`] before the final concatenation), so a cancelled job
/// stops without leaving a partial output file. Errors describe this file
/// only; the batch layer decides what they mean for sibling jobs.
pub async fn process_file(
    input: &Path,
    output_dir: &Path,
    options: &PipelineOptions,
    decoder: &dyn Decoder,
    encoder: &dyn Encoder,
    cancelled: &AtomicBool,
) -> Result<FileReport> {
    let start_time = Instant::now();

    if cancelled.load(Ordering::Relaxed) {
        return Err(QuietcutError::Cancelled);
    }

    if !input.exists() {
        return Err(QuietcutError::FileNotFound(input.display().to_string()));
    }

    let media_duration = decoder.probe_duration(input).await?;
    info!(
        input = %input.display(),
        duration_secs = media_duration.as_secs_f64(),
        "Processing file"
    );

    let decode_start = Instant::now();
    let pcm = decoder.decode_pcm(input).await?;
    let decode_time = decode_start.elapsed();

    let profile = compute_loudness_profile(&pcm, options.chunk_size);
    let total_chunks = profile.len();
    drop(pcm);

    let drops = select_drop_intervals(&profile, options.volume_percentage);
    let dropped_chunks = drops.len();

    let mut stats = PipelineStats {
        decode_time,
        assemble_time: Duration::ZERO,
        total_time: Duration::ZERO,
        media_duration,
        total_chunks,
        dropped_chunks,
    };

    if drops.is_empty() {
        info!(input = %input.display(), "No chunks below threshold, skipping");
        stats.total_time = start_time.elapsed();
        return Ok(FileReport {
            input: input.to_path_buf(),
            outcome: FileOutcome::Skipped(SkipReason::NoTrimNeeded),
            stats,
        });
    }

    let plan = plan_keep_intervals(&drops, media_duration.as_secs_f64());

    if plan.is_empty() {
        info!(input = %input.display(), "Everything below threshold, skipping");
        stats.total_time = start_time.elapsed();
        return Ok(FileReport {
            input: input.to_path_buf(),
            outcome: FileOutcome::Skipped(SkipReason::FullySilent),
            stats,
        });
    }

    if cancelled.load(Ordering::Relaxed) {
        return Err(QuietcutError::Cancelled);
    }

    let output = derive_output_path(input, output_dir);
    let assemble_start = Instant::now();
    assemble_clip(encoder, input, &plan, &output, cancelled).await?;
    stats.assemble_time = assemble_start.elapsed();
    stats.total_time = start_time.elapsed();

    let kept_secs = plan.kept_duration();
    let removed_secs = (media_duration.as_secs_f64() - kept_secs).max(0.0);

    info!(
        output = %output.display(),
        kept_secs,
        removed_secs,
        "File processed"
    );

    Ok(FileReport {
        input: input.to_path_buf(),
        outcome: FileOutcome::Trimmed {
            output,
            kept_secs,
            removed_secs,
        },
        stats,
    })
}
