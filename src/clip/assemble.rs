use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use tempfile::TempDir;
use tracing::{debug, info};

use super::ClipPlan;
use crate::error::{QuietcutError, Result};
use crate::media::Encoder;

/// Extract every keep-interval from `input` and concatenate them, in order,
/// into `output`.
///
/// Sub-clips are staged in a temp directory that is removed when assembly
/// finishes (or fails). Cuts are hard: each kept segment preserves its
/// original frame timing and segments join without transitions. The
/// cancellation token is honored once more between staging and the final
/// concatenation, before the output file is touched.
pub async fn assemble_clip(
    encoder: &dyn Encoder,
    input: &Path,
    plan: &ClipPlan,
    output: &Path,
    cancelled: &AtomicBool,
) -> Result<()> {
    if plan.is_empty() {
        return Err(QuietcutError::Encode(
            "Clip plan has no segments to assemble".to_string(),
        ));
    }

    let staging = TempDir::new().map_err(|e| {
        QuietcutError::Encode(format!("Failed to create staging directory: {e}"))
    })?;

    info!(
        segments = plan.keep.len(),
        staging = %staging.path().display(),
        "Assembling clip"
    );

    let mut parts = Vec::with_capacity(plan.keep.len());
    for (index, interval) in plan.keep.iter().enumerate() {
        let part_path = staging.path().join(format!("part_{:04}.mp4", index));
        debug!(index, %interval, "Extracting segment");
        encoder.extract_clip(input, &part_path, *interval).await?;
        parts.push(part_path);
    }

    if cancelled.load(Ordering::Relaxed) {
        return Err(QuietcutError::Cancelled);
    }

    encoder.concat_clips(&parts, output).await?;

    info!(output = %output.display(), "Clip assembled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::TimeInterval;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records every call instead of running a real encoder.
    #[derive(Default)]
    struct RecordingEncoder {
        extracted: Mutex<Vec<TimeInterval>>,
        concatenated: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Encoder for RecordingEncoder {
        async fn extract_clip(
            &self,
            _input: &Path,
            _output: &Path,
            interval: TimeInterval,
        ) -> Result<()> {
            self.extracted.lock().unwrap().push(interval);
            Ok(())
        }

        async fn concat_clips(&self, parts: &[PathBuf], _output: &Path) -> Result<()> {
            self.concatenated.lock().unwrap().push(parts.len());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_extracts_each_interval_in_order() {
        let encoder = RecordingEncoder::default();
        let plan = ClipPlan {
            keep: vec![TimeInterval::new(0.0, 3.0), TimeInterval::new(5.0, 10.0)],
        };
        let cancelled = AtomicBool::new(false);

        assemble_clip(
            &encoder,
            Path::new("in.mp4"),
            &plan,
            Path::new("out.mp4"),
            &cancelled,
        )
        .await
        .unwrap();

        let extracted = encoder.extracted.lock().unwrap();
        assert_eq!(*extracted, plan.keep);
        assert_eq!(*encoder.concatenated.lock().unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_empty_plan_is_an_error() {
        let encoder = RecordingEncoder::default();
        let cancelled = AtomicBool::new(false);

        let result = assemble_clip(
            &encoder,
            Path::new("in.mp4"),
            &ClipPlan::default(),
            Path::new("out.mp4"),
            &cancelled,
        )
        .await;

        assert!(matches!(result, Err(QuietcutError::Encode(_))));
        assert!(encoder.extracted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_skips_concat() {
        let encoder = RecordingEncoder::default();
        let plan = ClipPlan {
            keep: vec![TimeInterval::new(0.0, 1.0)],
        };
        let cancelled = AtomicBool::new(true);

        let result = assemble_clip(
            &encoder,
            Path::new("in.mp4"),
            &plan,
            Path::new("out.mp4"),
            &cancelled,
        )
        .await;

        assert!(matches!(result, Err(QuietcutError::Cancelled)));
        assert!(encoder.concatenated.lock().unwrap().is_empty());
    }
}
