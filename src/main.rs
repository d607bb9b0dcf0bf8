use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use quietcut::batch::{BatchCoordinator, BatchSummary, JobOutcome, ProgressEvent};
use quietcut::config::Config;
use quietcut::interactive::run_interactive_wizard;
use quietcut::media::{check_ffmpeg, check_ffprobe, FfmpegDecoder, FfmpegEncoder, LogSink};
use quietcut::report::write_report;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "quietcut")]
#[command(version, about = "Remove low-volume segments from videos")]
#[command(long_about = "Scan a folder of videos, detect low-volume intervals in each audio \
track, and re-encode the remaining segments of each file into one trimmed clip.")]
struct Cli {
    /// Folder containing input videos (.mp4, .mkv)
    input_dir: Option<PathBuf>,

    /// Folder for trimmed output videos
    output_dir: Option<PathBuf>,

    /// Volume threshold percentage, 0-10
    #[arg(short = 't', long)]
    threshold: Option<f64>,

    /// Number of files processed concurrently
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Loudness chunk size in samples
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Analysis sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Write a JSON batch report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Prompt for folders and threshold instead of using arguments
    #[arg(short, long)]
    interactive: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let (input_dir, output_dir, mut config) = if cli.interactive {
        let wizard = run_interactive_wizard()?;
        (wizard.input_dir, wizard.output_dir, wizard.config)
    } else {
        let input_dir = cli
            .input_dir
            .clone()
            .context("INPUT_DIR is required (or use --interactive)")?;
        let output_dir = cli
            .output_dir
            .clone()
            .context("OUTPUT_DIR is required (or use --interactive)")?;
        let config = Config::load().context("Failed to load configuration")?;
        (input_dir, output_dir, config)
    };

    if let Some(threshold) = cli.threshold {
        config.volume_percentage = threshold;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.chunk_size = chunk_size;
    }
    if let Some(sample_rate) = cli.sample_rate {
        config.sample_rate = sample_rate;
    }
    config.validate().context("Configuration validation failed")?;

    check_ffmpeg().map_err(|_| {
        anyhow::anyhow!(
            "FFmpeg not found. Install it with: brew install ffmpeg (macOS) or apt install ffmpeg (Linux)"
        )
    })?;
    check_ffprobe()?;

    info!("Input:     {}", input_dir.display());
    info!("Output:    {}", output_dir.display());
    info!("Threshold: {}", config.volume_percentage);
    info!("Workers:   {}", config.concurrency);

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        ctrlc::set_handler(move || {
            eprintln!("\nCancelling, running jobs will stop at the next stage boundary...");
            cancelled.store(true, Ordering::Relaxed);
        })
        .context("Failed to install Ctrl+C handler")?;
    }

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let diag_tx = tx.clone();
    let log_sink: LogSink = Arc::new(move |input: &Path, line: &str| {
        let file = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _ = diag_tx.send(ProgressEvent::Diagnostic {
            file,
            line: line.to_string(),
        });
    });

    let decoder = Arc::new(FfmpegDecoder::new(config.sample_rate));
    let encoder = Arc::new(FfmpegEncoder::new().with_log_sink(log_sink));
    let coordinator = BatchCoordinator::new(config, decoder, encoder);

    let batch = {
        let cancelled = cancelled.clone();
        let input_dir = input_dir.clone();
        let output_dir = output_dir.clone();
        tokio::spawn(async move { coordinator.run(&input_dir, &output_dir, tx, cancelled).await })
    };

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut job_outcomes: Vec<(String, JobOutcome)> = Vec::new();

    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Progress { percent } => {
                pb.set_position(percent.round() as u64);
            }
            ProgressEvent::Status { file, outcome } => {
                let line = match &outcome {
                    JobOutcome::Succeeded { output } => format!(
                        "{} {} -> {}",
                        style("✓").green(),
                        file,
                        output.display()
                    ),
                    JobOutcome::Skipped(reason) => {
                        format!("{} {}: {}", style("-").yellow(), file, reason)
                    }
                    JobOutcome::Failed(reason) => {
                        format!("{} {}: {}", style("✗").red(), file, reason)
                    }
                };
                pb.println(line);
                job_outcomes.push((file, outcome));
            }
            ProgressEvent::Diagnostic { file, line } => {
                debug!("encoder [{}]: {}", file, line.trim());
            }
            ProgressEvent::Finished { .. } => {}
        }
    }

    pb.finish_and_clear();

    let summary = batch.await.context("Batch task panicked")??;

    if let Some(report_path) = cli.report {
        write_report(&report_path, &summary, &job_outcomes)
            .context("Failed to write batch report")?;
        info!("Report written to {}", report_path.display());
    }

    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                        Batch Complete                          ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Files:    {}", summary.total);
    println!("  Trimmed:  {}", summary.succeeded);
    println!("  Skipped:  {}", summary.skipped);
    println!("  Failed:   {}", summary.failed);
    println!();
}
