//! Error types for the pdf2docx library.
//!
//! [`ConvertError`] carries fine-grained, context-rich variants (which file,
//! which page, what the backend said), while [`ConvertError::classification`]
//! folds them into the coarse [`ErrorClass`] taxonomy that front-end
//! collaborators act on. The front-end never needs to match on individual
//! variants: it receives a class plus a human-readable message and decides
//! how to surface them.
//!
//! Cleanup failures are deliberately NOT a job outcome. They are logged with
//! the [`ErrorClass::ResourceCleanup`] label and never override or mask the
//! result of the pipeline — see `job::ConversionJob::cleanup`.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2docx library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the path the front-end handed over.
    #[error("input file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("file is not a valid PDF: '{path}' (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// HTTP URL was syntactically valid but download failed.
    #[error("failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Source document errors ────────────────────────────────────────────
    /// The document could not be parsed (corrupt header, broken xref, …).
    #[error("PDF '{path}' cannot be read: {detail}")]
    SourceUnreadable { path: PathBuf, detail: String },

    /// The document is encrypted and no usable password was supplied.
    #[error("PDF '{path}' is encrypted and requires a password")]
    PasswordRequired { path: PathBuf },

    /// A password was supplied but it is wrong.
    #[error("wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The rasterization backend failed on a specific page.
    #[error("rasterization failed for page {page}: {detail}")]
    RasterizationFailed { page: usize, detail: String },

    /// No rasterization backend could be bound (e.g. pdfium library missing).
    #[error("no rasterization backend available: {0}")]
    BackendUnavailable(String),

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// A page raster could not be decoded, rescaled, or re-encoded.
    ///
    /// This aborts the whole job: silently dropping the page would break
    /// the contiguous page-sequence invariant.
    #[error("page {page} could not be normalized: {detail}")]
    ImageProcessing { page: usize, detail: String },

    /// The output document could not be constructed.
    #[error("document assembly failed: {detail}")]
    Assembly { detail: String },

    /// Could not create or write the output document file.
    #[error("failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Delivery errors ───────────────────────────────────────────────────
    /// The delivery collaborator exceeded its transport deadline.
    #[error("delivery timed out after {secs}s")]
    DeliveryTimeout { secs: u64 },

    /// The delivery collaborator failed for a non-timeout reason.
    #[error("delivery failed: {detail}")]
    DeliveryFailed { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (panicked worker task, tempdir failure, …).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse error classification handed to front-end collaborators.
///
/// `ResourceCleanup` never reaches a caller as a job outcome; it exists so
/// cleanup log lines carry the same vocabulary as the rest of the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Input is not a valid, parsable, decryptable document.
    SourceUnreadable,
    /// A page raster failed to normalize; the job was aborted.
    ImageProcessing,
    /// The output document could not be constructed or written.
    Assembly,
    /// A cleanup step failed. Logged only.
    ResourceCleanup,
    /// The transport exceeded its deadline while sending the result.
    DeliveryTimeout,
    /// Environment or logic fault outside the taxonomy above.
    Internal,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorClass::SourceUnreadable => "source_unreadable",
            ErrorClass::ImageProcessing => "image_processing",
            ErrorClass::Assembly => "assembly",
            ErrorClass::ResourceCleanup => "resource_cleanup",
            ErrorClass::DeliveryTimeout => "delivery_timeout",
            ErrorClass::Internal => "internal",
        };
        f.write_str(s)
    }
}

impl ConvertError {
    /// Fold this error into the coarse taxonomy a front-end reports on.
    pub fn classification(&self) -> ErrorClass {
        match self {
            ConvertError::FileNotFound { .. }
            | ConvertError::NotAPdf { .. }
            | ConvertError::DownloadFailed { .. }
            | ConvertError::DownloadTimeout { .. }
            | ConvertError::SourceUnreadable { .. }
            | ConvertError::PasswordRequired { .. }
            | ConvertError::WrongPassword { .. }
            | ConvertError::RasterizationFailed { .. } => ErrorClass::SourceUnreadable,
            ConvertError::ImageProcessing { .. } => ErrorClass::ImageProcessing,
            ConvertError::Assembly { .. } | ConvertError::OutputWriteFailed { .. } => {
                ErrorClass::Assembly
            }
            ConvertError::DeliveryTimeout { .. } => ErrorClass::DeliveryTimeout,
            ConvertError::DeliveryFailed { .. }
            | ConvertError::BackendUnavailable(_)
            | ConvertError::InvalidConfig(_)
            | ConvertError::Internal(_) => ErrorClass::Internal,
        }
    }
}

/// Error returned by a delivery collaborator from `run_job`'s closure.
///
/// Mapped onto [`ConvertError`] by the orchestrator: `Timeout` becomes
/// [`ConvertError::DeliveryTimeout`], everything else
/// [`ConvertError::DeliveryFailed`]. Cleanup runs either way.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The transport exceeded its own deadline while sending the result.
    #[error("transport deadline exceeded after {secs}s")]
    Timeout { secs: u64 },

    /// Any other transport failure.
    #[error("{0}")]
    Transport(String),
}
