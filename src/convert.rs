//! Convenience conversion entry points.
//!
//! These wrap [`crate::job::run_job`] for callers that don't need a custom
//! delivery collaborator: the finished document comes back as bytes
//! ([`convert`], [`convert_from_bytes`]) or is copied atomically to a path of
//! the caller's choosing ([`convert_to_file`]). In every case the job's own
//! artifacts — working directory, page rasters, on-disk output document —
//! are gone by the time the call returns.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, DeliveryError};
use crate::job::{run_job, JobRequest};
use crate::output::{ConversionOutput, JobSummary, OutputDocument};
use crate::pipeline::input::{self, InputArtifact};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Convert a PDF file or URL into a paginated `.docx`.
///
/// The declared input filename (for output naming) is derived from the path
/// or URL.
///
/// # Errors
/// Any pipeline failure aborts the whole job — see
/// [`ConvertError::classification`] for the coarse taxonomy front-ends
/// report on. No partial document is ever returned.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let input_str = input_str.as_ref();
    let (artifact, filename) = if input::is_url(input_str) {
        (
            InputArtifact::Url(input_str.to_string()),
            Some(input::filename_from_url(input_str)),
        )
    } else {
        let path = PathBuf::from(input_str);
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from);
        (InputArtifact::LocalPath(path), filename)
    };
    convert_artifact(artifact, filename, config).await
}

/// Convert PDF bytes in memory into a paginated `.docx`.
///
/// The bytes are materialized inside the job's working directory and removed
/// with it. `filename` is the caller-declared input name used for output
/// naming; pass `None` to use the fixed placeholder.
pub async fn convert_from_bytes(
    bytes: &[u8],
    filename: Option<&str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    convert_artifact(
        InputArtifact::Bytes(bytes.to_vec()),
        filename.map(String::from),
        config,
    )
    .await
}

/// Convert a PDF and write the document to `output_path`.
///
/// Uses atomic write (temp file + rename) so a crash never leaves a partial
/// document at the destination.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<JobSummary, ConvertError> {
    let output = convert(input_str, config).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConvertError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    let tmp_path = path.with_extension("docx.tmp");
    tokio::fs::write(&tmp_path, &output.document)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.summary)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("failed to create tokio runtime: {e}")))?
        .block_on(convert(input_str, config))
}

/// Run a job whose delivery step captures the document bytes.
async fn convert_artifact(
    artifact: InputArtifact,
    filename: Option<String>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, ConvertError> {
    let sink: Arc<Mutex<Vec<u8>>> = Arc::default();
    let sink2 = Arc::clone(&sink);

    let summary = run_job(
        JobRequest::new(artifact, filename),
        config,
        move |doc: OutputDocument| async move {
            let bytes = tokio::fs::read(&doc.path).await.map_err(|e| {
                DeliveryError::Transport(format!("failed to read assembled document: {e}"))
            })?;
            let mut guard = sink2
                .lock()
                .map_err(|_| DeliveryError::Transport("result buffer poisoned".into()))?;
            *guard = bytes;
            Ok(())
        },
    )
    .await?;

    let document = {
        let mut guard = sink
            .lock()
            .map_err(|_| ConvertError::Internal("result buffer poisoned".into()))?;
        std::mem::take(&mut *guard)
    };

    Ok(ConversionOutput {
        filename: summary.output_filename.clone(),
        document,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use tempfile::TempDir;

    fn config(out_ns: &TempDir) -> ConversionConfig {
        ConversionConfig::builder()
            .output_dir(out_ns.path())
            .build()
            .expect("valid config")
    }

    #[tokio::test]
    async fn missing_input_file_fails_before_rasterization() {
        let out_ns = TempDir::new().unwrap();
        let err = convert("/definitely/not/a/real/file.pdf", &config(&out_ns))
            .await
            .expect_err("missing file must error");
        assert!(matches!(err, ConvertError::FileNotFound { .. }), "got: {err}");
        assert_eq!(err.classification(), ErrorClass::SourceUnreadable);

        // Even a failed acquisition releases its reserved output name.
        assert!(std::fs::read_dir(out_ns.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn non_pdf_bytes_fail_before_rasterization() {
        let out_ns = TempDir::new().unwrap();
        let err = convert_from_bytes(b"GIF89a...", Some("image.gif"), &config(&out_ns))
            .await
            .expect_err("non-PDF bytes must error");
        assert!(matches!(err, ConvertError::NotAPdf { .. }), "got: {err}");
        assert!(std::fs::read_dir(out_ns.path()).unwrap().next().is_none());
    }
}
