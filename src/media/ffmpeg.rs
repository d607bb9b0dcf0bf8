use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info};

use super::{Decoder, Encoder, LogSink};
use crate::audio::PcmBuffer;
use crate::clip::TimeInterval;
use crate::error::{QuietcutError, Result};

/// Check if FFmpeg is installed and accessible.
pub fn check_ffmpeg() -> Result<()> {
    let output = Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map_err(|e| {
            QuietcutError::MediaDecode(format!(
                "FFmpeg not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(QuietcutError::MediaDecode(
            "FFmpeg check failed".to_string(),
        ));
    }

    debug!("FFmpeg is available");
    Ok(())
}

/// Check if FFprobe is installed and accessible.
pub fn check_ffprobe() -> Result<()> {
    let output = Command::new("ffprobe")
        .arg("-version")
        .output()
        .map_err(|e| {
            QuietcutError::MediaDecode(format!(
                "FFprobe not found. Please install FFmpeg (includes FFprobe). Error: {e}"
            ))
        })?;

    if !output.status.success() {
        return Err(QuietcutError::MediaDecode(
            "FFprobe check failed".to_string(),
        ));
    }

    debug!("FFprobe is available");
    Ok(())
}

/// Get a media file's total duration using FFprobe.
pub fn probe_media_duration(input: &Path) -> Result<Duration> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output()
        .map_err(|e| QuietcutError::MediaDecode(format!("Failed to run FFprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(QuietcutError::MediaDecode(format!(
            "FFprobe failed: {stderr}"
        )));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    let duration_secs: f64 = duration_str.trim().parse().map_err(|e| {
        QuietcutError::MediaDecode(format!(
            "Failed to parse duration '{}': {e}",
            duration_str.trim()
        ))
    })?;

    Ok(Duration::from_secs_f64(duration_secs))
}

/// Subprocess-backed audio decoder.
///
/// Pipes raw little-endian s16 samples from FFmpeg's stdout; both stdout and
/// stderr are collected in full before the call returns, so a full pipe
/// buffer can never deadlock the child, and the stderr text is available for
/// error reporting.
pub struct FfmpegDecoder {
    sample_rate: u32,
}

impl FfmpegDecoder {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

#[async_trait]
impl Decoder for FfmpegDecoder {
    async fn probe_duration(&self, input: &Path) -> Result<Duration> {
        probe_media_duration(input)
    }

    async fn decode_pcm(&self, input: &Path) -> Result<PcmBuffer> {
        if !input.exists() {
            return Err(QuietcutError::FileNotFound(input.display().to_string()));
        }

        info!(input = %input.display(), "Decoding audio track to PCM");

        let output = Command::new("ffmpeg")
            .arg("-i")
            .arg(input)
            .args([
                "-vn",
                "-acodec",
                "pcm_s16le",
                "-ar",
                &self.sample_rate.to_string(),
                "-ac",
                "1",
                "-f",
                "s16le",
                "-",
            ])
            .output()
            .map_err(|e| QuietcutError::MediaDecode(format!("Failed to run FFmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(QuietcutError::MediaDecode(format!(
                "FFmpeg could not decode {}: {}",
                input.display(),
                last_lines(&stderr, 8)
            )));
        }

        let samples = bytes_to_samples(&output.stdout);
        debug!(samples = samples.len(), "PCM decode complete");

        Ok(PcmBuffer::new(samples, self.sample_rate))
    }
}

/// Interpret raw FFmpeg stdout as little-endian signed 16-bit samples.
fn bytes_to_samples(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

fn last_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

/// Subprocess-backed clip encoder.
///
/// Sub-clips are re-encoded with H.264 video and AAC audio so cuts land
/// exactly on the requested boundaries; concatenation stream-copies the
/// already-matching parts. Lines carrying the `frame=` counter on FFmpeg's
/// stderr are forwarded to the optional log sink; the rest of the stream is
/// still consumed and kept for error reporting.
pub struct FfmpegEncoder {
    log_sink: Option<LogSink>,
    frame_re: Regex,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self {
            log_sink: None,
            frame_re: Regex::new(r"frame=\s*\d+").expect("valid frame counter pattern"),
        }
    }

    /// Forward `frame=` diagnostic lines to `sink`.
    pub fn with_log_sink(mut self, sink: LogSink) -> Self {
        self.log_sink = Some(sink);
        self
    }

    fn run_streaming(&self, mut command: Command, input: &Path, context: &str) -> Result<()> {
        let mut child = command
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| QuietcutError::Encode(format!("Failed to spawn FFmpeg: {e}")))?;

        let mut stderr_lines = Vec::new();
        if let Some(stderr) = child.stderr.take() {
            let reader = BufReader::new(stderr);
            for line in reader.lines().map_while(|l| l.ok()) {
                if let (Some(sink), true) = (&self.log_sink, self.frame_re.is_match(&line)) {
                    sink(input, &line);
                }
                stderr_lines.push(line);
            }
        }

        let status = child
            .wait()
            .map_err(|e| QuietcutError::Encode(format!("Failed to wait for FFmpeg: {e}")))?;

        if !status.success() {
            let tail = last_lines(&stderr_lines.join("\n"), 8);
            return Err(QuietcutError::Encode(format!("{context}: {tail}")));
        }

        Ok(())
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn extract_clip(
        &self,
        input: &Path,
        output: &Path,
        interval: TimeInterval,
    ) -> Result<()> {
        let start = format!("{:.3}", interval.start);
        let duration = format!("{:.3}", interval.duration());

        debug!(
            input = %input.display(),
            %interval,
            "Extracting sub-clip"
        );

        let mut command = Command::new("ffmpeg");
        command
            .args(["-y", "-ss", &start, "-t", &duration, "-i"])
            .arg(input)
            .args(["-c:v", "libx264", "-c:a", "aac"])
            .arg(output);

        self.run_streaming(
            command,
            input,
            &format!("FFmpeg sub-clip extraction failed for {}", input.display()),
        )?;

        if !output.exists() {
            return Err(QuietcutError::Encode(
                "Sub-clip file was not created".to_string(),
            ));
        }

        Ok(())
    }

    async fn concat_clips(&self, parts: &[PathBuf], output: &Path) -> Result<()> {
        if parts.is_empty() {
            return Err(QuietcutError::Encode(
                "No sub-clips to concatenate".to_string(),
            ));
        }

        let list_dir = parts[0]
            .parent()
            .ok_or_else(|| QuietcutError::Encode("Sub-clip path has no parent".to_string()))?;
        let list_path = list_dir.join("concat.txt");

        let mut listing = String::new();
        for part in parts {
            listing.push_str(&format!("file '{}'\n", escape_concat_path(part)));
        }
        std::fs::write(&list_path, listing)
            .map_err(|e| QuietcutError::Encode(format!("Failed to write concat list: {e}")))?;

        info!(parts = parts.len(), output = %output.display(), "Concatenating sub-clips");

        // parts share codecs by construction, so stream copy is safe
        let mut command = Command::new("ffmpeg");
        command
            .args(["-y", "-f", "concat", "-safe", "0", "-i"])
            .arg(&list_path)
            .args(["-c", "copy"])
            .arg(output);

        self.run_streaming(command, output, "FFmpeg concatenation failed")?;

        if !output.exists() {
            return Err(QuietcutError::Encode(
                "Output file was not created".to_string(),
            ));
        }

        Ok(())
    }
}

/// The concat demuxer wraps paths in single quotes; embedded quotes need the
/// `'\''` escape.
fn escape_concat_path(path: &Path) -> String {
    path.display().to_string().replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffmpeg_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_check_ffmpeg() {
        if !ffmpeg_available() {
            eprintln!("Skipping test: FFmpeg not available or broken");
            return;
        }
        assert!(check_ffmpeg().is_ok());
    }

    #[test]
    fn test_bytes_to_samples_little_endian() {
        let bytes = [0x01, 0x00, 0xFF, 0xFF, 0x00, 0x80];
        let samples = bytes_to_samples(&bytes);
        assert_eq!(samples, vec![1, -1, i16::MIN]);
    }

    #[test]
    fn test_bytes_to_samples_ignores_trailing_byte() {
        let bytes = [0x01, 0x00, 0x02];
        assert_eq!(bytes_to_samples(&bytes), vec![1]);
    }

    #[test]
    fn test_frame_counter_pattern() {
        let encoder = FfmpegEncoder::new();
        assert!(encoder
            .frame_re
            .is_match("frame=  240 fps= 48 q=28.0 size=    1024kB"));
        assert!(encoder.frame_re.is_match("frame=1"));
        assert!(!encoder.frame_re.is_match("size=1024kB bitrate=900kbits/s"));
    }

    #[test]
    fn test_escape_concat_path() {
        assert_eq!(
            escape_concat_path(Path::new("/tmp/it's.mp4")),
            r"/tmp/it'\''s.mp4"
        );
        assert_eq!(escape_concat_path(Path::new("/tmp/a.mp4")), "/tmp/a.mp4");
    }

    #[test]
    fn test_last_lines_truncates() {
        let text = "a\nb\n\nc\nd";
        assert_eq!(last_lines(text, 2), "c\nd");
        assert_eq!(last_lines(text, 10), "a\nb\nc\nd");
    }

    #[tokio::test]
    async fn test_decode_missing_file() {
        let decoder = FfmpegDecoder::new(44_100);
        let result = decoder.decode_pcm(Path::new("/nonexistent/file.mp4")).await;
        assert!(matches!(result, Err(QuietcutError::FileNotFound(_))));
    }
}
