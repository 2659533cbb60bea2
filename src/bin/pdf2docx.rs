//! CLI binary for pdf2docx.
//!
//! A thin front-end collaborator over the library crate: maps CLI flags to
//! `ConversionConfig`, shows job progress, and writes the delivered document
//! to disk. All conversion logic and artifact lifetime management live in
//! the library.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2docx::{
    convert, ConversionConfig, JobProgress, JobState,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner whose message tracks the job state.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl JobProgress for CliProgress {
    fn on_state(&self, state: JobState) {
        let msg = match state {
            JobState::Received => "Reading PDF…",
            JobState::Rasterizing => "Converting pages to images…",
            JobState::Normalizing => "Optimizing images…",
            JobState::Assembling => "Creating Word document…",
            JobState::Delivering => "Writing result…",
            JobState::Cleanup => "Cleaning up…",
            JobState::Done => "Done",
            JobState::Errored => "Failed",
        };
        self.bar.set_message(msg);
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert; output name is derived from the input (report.pdf → report_converted.docx)
  pdf2docx report.pdf

  # Convert to an explicit destination
  pdf2docx report.pdf -o ~/Documents/report.docx

  # Convert from a URL
  pdf2docx https://example.com/scan.pdf

  # Encrypted input, machine-readable summary
  pdf2docx --password hunter2 --json locked.pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to an existing libpdfium shared library
"#;

/// Convert PDF files and URLs to Word documents with one page image per page.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2docx",
    version,
    about = "Convert PDF files and URLs to Word documents with one page image per page",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the document to this path instead of the derived name in the
    /// current directory.
    #[arg(short, long, env = "PDF2DOCX_OUTPUT")]
    output: Option<PathBuf>,

    /// Rasterization scale over the 72-DPI baseline (2.0 ≈ 150 DPI).
    #[arg(long, env = "PDF2DOCX_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// Linear rescale ratio applied to each page image (0–1].
    #[arg(long, env = "PDF2DOCX_RESIZE", default_value_t = 0.7)]
    resize: f32,

    /// JPEG quality for page images (1–100).
    #[arg(long, env = "PDF2DOCX_QUALITY", default_value_t = 75,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Maximum embedded image width in inches.
    #[arg(long, env = "PDF2DOCX_WIDTH", default_value_t = 5.5)]
    width: f32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2DOCX_PASSWORD")]
    password: Option<String>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2DOCX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the job summary as JSON instead of human-readable text.
    #[arg(long, env = "PDF2DOCX_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2DOCX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2DOCX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress = if show_progress {
        Some(CliProgress::new())
    } else {
        None
    };

    let mut builder = ConversionConfig::builder()
        .raster_scale(cli.scale)
        .resize_ratio(cli.resize)
        .jpeg_quality(cli.quality)
        .max_image_width_inches(cli.width)
        .download_timeout_secs(cli.download_timeout);
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(ref cb) = progress {
        builder = builder.progress(Arc::clone(cb) as Arc<dyn JobProgress>);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert(&cli.input, &config).await;

    if let Some(ref cb) = progress {
        cb.bar.finish_and_clear();
    }

    let output = result.context("Conversion failed")?;

    let destination = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&output.filename));
    tokio::fs::write(&destination, &output.document)
        .await
        .with_context(|| format!("Failed to write {}", destination.display()))?;

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output.summary).context("Failed to serialize summary")?
        );
    } else if !cli.quiet {
        eprintln!(
            "✔ {} pages → {}  ({}ms)",
            output.summary.page_count,
            destination.display(),
            output.summary.total_duration_ms
        );
    }

    Ok(())
}
