//! # pdf2docx
//!
//! Convert a PDF document into a paginated Word document in which every
//! source page is embedded as a raster image, preserving page order.
//!
//! ## Why images instead of text extraction?
//!
//! Text-reconstruction converters mangle anything with a non-trivial layout:
//! scanned contracts, forms, multi-column pages, stamps, and signatures come
//! out garbled or rearranged. Rasterizing each page and embedding the images
//! one per page produces a document that is visually faithful to the source,
//! always — the receiving side just needs a word processor.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      materialize bytes / URL / local path (magic-byte check)
//!  ├─ 2. Rasterize  render each page via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Normalize  rescale 70% + JPEG q75 to bound document size
//!  ├─ 4. Assemble   one image per page, fixed width, page breaks (.docx)
//!  ├─ 5. Deliver    hand the document to the front-end collaborator
//!  └─ 6. Cleanup    remove every artifact, on every exit path
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2docx::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("scan.pdf", &config).await?;
//!     std::fs::write(&output.filename, &output.document)?;
//!     eprintln!("{} pages in {}ms",
//!         output.summary.page_count,
//!         output.summary.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! Front-ends that transmit the result themselves (a chat bot, an HTTP
//! handler) should use [`run_job`] directly and hand over a delivery
//! closure; the orchestrator guarantees that the working directory, the
//! intermediate page rasters, and the output document are all removed before
//! the call returns — success, failure, or cancellation.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2docx` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod job;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_from_bytes, convert_sync, convert_to_file};
pub use error::{ConvertError, DeliveryError, ErrorClass};
pub use job::{run_job, JobRequest, JobState};
pub use output::{ConversionOutput, JobSummary, OutputDocument, PageImage};
pub use pipeline::input::InputArtifact;
pub use pipeline::raster::{PdfiumRasterizer, Rasterizer};
pub use progress::{JobProgress, NoopJobProgress};
