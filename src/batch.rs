//! Batch coordination: fan the per-file pipeline out over a bounded worker
//! pool and fan progress back into one channel.
//!
//! Each job moves `Pending` (queued on the semaphore) → `Running` (permit
//! held) → one terminal outcome, reported exactly once. A job failure is
//! converted into [`JobOutcome::Failed`] at this boundary and never aborts
//! sibling jobs; batch-level problems (no inputs, bad config) fail the run
//! before any worker spawns.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{QuietcutError, Result};
use crate::media::{Decoder, Encoder};
use crate::pipeline::{process_file, FileOutcome, PipelineOptions, SkipReason};

/// File extensions recognized as batch inputs.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv"];

/// Terminal state of one job.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Succeeded { output: PathBuf },
    Skipped(SkipReason),
    Failed(String),
}

/// Events emitted on the progress channel, in the order jobs actually
/// complete.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Overall completion percentage; emitted once per finished job,
    /// monotonically non-decreasing.
    Progress { percent: f64 },
    /// A job reached its terminal state.
    Status { file: String, outcome: JobOutcome },
    /// Raw encoder log line (frame counter), forwarded verbatim.
    Diagnostic { file: String, line: String },
    /// The batch is done; emitted exactly once, even if every job failed.
    Finished { summary: BatchSummary },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Runs the per-file pipeline across a bounded pool of workers.
pub struct BatchCoordinator {
    config: Config,
    decoder: Arc<dyn Decoder>,
    encoder: Arc<dyn Encoder>,
}

impl BatchCoordinator {
    pub fn new(config: Config, decoder: Arc<dyn Decoder>, encoder: Arc<dyn Encoder>) -> Self {
        Self {
            config,
            decoder,
            encoder,
        }
    }

    /// Process every recognized video in `input_dir`, writing trimmed clips
    /// into `output_dir` and reporting progress on `events`.
    pub async fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        events: UnboundedSender<ProgressEvent>,
        cancelled: Arc<AtomicBool>,
    ) -> Result<BatchSummary> {
        self.config.validate()?;

        if !input_dir.is_dir() {
            return Err(QuietcutError::InvalidConfig(format!(
                "Input folder does not exist: {}",
                input_dir.display()
            )));
        }
        std::fs::create_dir_all(output_dir)?;

        let inputs = discover_inputs(input_dir)?;
        if inputs.is_empty() {
            return Err(QuietcutError::NoInputFiles(format!(
                "no .mp4 or .mkv files in {}",
                input_dir.display()
            )));
        }

        let total = inputs.len();
        info!(
            total,
            concurrency = self.config.concurrency,
            "Starting batch"
        );

        let options = Arc::new(PipelineOptions {
            volume_percentage: self.config.volume_percentage,
            chunk_size: self.config.chunk_size,
        });

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut futures = FuturesUnordered::new();

        for input in inputs {
            let sem = semaphore.clone();
            let decoder = self.decoder.clone();
            let encoder = self.encoder.clone();
            let options = options.clone();
            let cancelled = cancelled.clone();
            let output_dir = output_dir.to_path_buf();

            futures.push(async move {
                let _permit = sem.acquire().await.expect("Semaphore closed");

                let outcome = match process_file(
                    &input,
                    &output_dir,
                    &options,
                    decoder.as_ref(),
                    encoder.as_ref(),
                    &cancelled,
                )
                .await
                {
                    Ok(report) => match report.outcome {
                        FileOutcome::Trimmed { output, .. } => JobOutcome::Succeeded { output },
                        FileOutcome::Skipped(reason) => JobOutcome::Skipped(reason),
                    },
                    Err(e) => {
                        warn!(input = %input.display(), error = %e, "Job failed");
                        JobOutcome::Failed(e.to_string())
                    }
                };

                (input, outcome)
            });
        }

        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };
        let mut completed = 0usize;

        while let Some((input, outcome)) = futures.next().await {
            completed += 1;
            match &outcome {
                JobOutcome::Succeeded { .. } => summary.succeeded += 1,
                JobOutcome::Skipped(_) => summary.skipped += 1,
                JobOutcome::Failed(_) => summary.failed += 1,
            }

            let _ = events.send(ProgressEvent::Status {
                file: display_name(&input),
                outcome,
            });
            let _ = events.send(ProgressEvent::Progress {
                percent: completed as f64 / total as f64 * 100.0,
            });
        }

        info!(
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "Batch complete"
        );

        let _ = events.send(ProgressEvent::Finished {
            summary: summary.clone(),
        });

        Ok(summary)
    }
}

/// List the recognized video files in a directory, sorted by name so
/// submission order is deterministic.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.mp4"), b"").unwrap();
        fs::write(dir.path().join("a.MKV"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("nested.mp4")).unwrap();

        let files = discover_inputs(dir.path()).unwrap();
        let names: Vec<String> = files.iter().map(|p| display_name(p)).collect();
        assert_eq!(names, vec!["a.MKV", "b.mp4"]);
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_inputs(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/a/b/clip.mp4")), "clip.mp4");
    }
}
