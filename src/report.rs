// Machine-readable batch report
use std::path::Path;

use serde::Serialize;

use crate::batch::{BatchSummary, JobOutcome};
use crate::error::Result;

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a BatchSummary,
    jobs: Vec<JsonJob>,
}

#[derive(Serialize)]
struct JsonJob {
    file: String,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Write the per-job outcomes and summary as pretty-printed JSON.
pub fn write_report(
    path: &Path,
    summary: &BatchSummary,
    jobs: &[(String, JobOutcome)],
) -> Result<()> {
    let report = JsonReport {
        summary,
        jobs: jobs
            .iter()
            .map(|(file, outcome)| match outcome {
                JobOutcome::Succeeded { output } => JsonJob {
                    file: file.clone(),
                    outcome: "succeeded",
                    output: Some(output.display().to_string()),
                    reason: None,
                },
                JobOutcome::Skipped(reason) => JsonJob {
                    file: file.clone(),
                    outcome: "skipped",
                    output: None,
                    reason: Some(reason.to_string()),
                },
                JobOutcome::Failed(reason) => JsonJob {
                    file: file.clone(),
                    outcome: "failed",
                    output: None,
                    reason: Some(reason.clone()),
                },
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&report)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SkipReason;
    use std::path::PathBuf;

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let summary = BatchSummary {
            total: 3,
            succeeded: 1,
            skipped: 1,
            failed: 1,
        };
        let jobs = vec![
            (
                "a.mp4".to_string(),
                JobOutcome::Succeeded {
                    output: PathBuf::from("/out/a.mp4"),
                },
            ),
            (
                "b.mp4".to_string(),
                JobOutcome::Skipped(SkipReason::NoTrimNeeded),
            ),
            (
                "c.mp4".to_string(),
                JobOutcome::Failed("Media decode failed: broken".to_string()),
            ),
        ];

        write_report(&path, &summary, &jobs).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"total\": 3"));
        assert!(contents.contains("\"outcome\": \"succeeded\""));
        assert!(contents.contains("\"output\": \"/out/a.mp4\""));
        assert!(contents.contains("\"outcome\": \"skipped\""));
        assert!(contents.contains("broken"));
    }
}
