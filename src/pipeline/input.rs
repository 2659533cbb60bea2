//! Input acquisition: materialize the front-end's artifact as a local PDF.
//!
//! ## Why materialize into the job's working directory?
//!
//! pdfium requires a file-system path — it cannot stream from a byte buffer.
//! Bytes and URL downloads are written into the job's `TempDir`, so the
//! working-directory cleanup that is already unconditional covers them too;
//! no separate lifetime tracking is needed. We validate the PDF magic bytes
//! (`%PDF`) before returning so callers get a meaningful error rather than a
//! backend crash deep inside rasterization.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The input artifact a front-end collaborator hands to a job.
pub enum InputArtifact {
    /// Raw PDF bytes (e.g. received over a chat transport).
    Bytes(Vec<u8>),
    /// HTTP/HTTPS URL; downloaded into the job's working directory.
    Url(String),
    /// A file the front-end downloaded for this job. The job takes
    /// ownership and deletes it during cleanup.
    OwnedPath(PathBuf),
    /// A caller-owned file. Read but never deleted.
    LocalPath(PathBuf),
}

impl std::fmt::Debug for InputArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputArtifact::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            InputArtifact::Url(u) => write!(f, "Url({u})"),
            InputArtifact::OwnedPath(p) => write!(f, "OwnedPath({})", p.display()),
            InputArtifact::LocalPath(p) => write!(f, "LocalPath({})", p.display()),
        }
    }
}

/// A materialized input: a readable local PDF path, plus whether the job
/// owns (and must delete) a file outside its working directory.
#[derive(Debug)]
pub struct AcquiredInput {
    pub path: PathBuf,
    pub owned: bool,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Materialize `artifact` as a local PDF file, validating magic bytes.
///
/// `workdir` is the job's working directory; bytes and downloads land there.
pub async fn acquire(
    artifact: InputArtifact,
    workdir: &Path,
    config: &ConversionConfig,
) -> Result<AcquiredInput, ConvertError> {
    match artifact {
        InputArtifact::Bytes(bytes) => {
            let path = workdir.join("input.pdf");
            check_magic_bytes(&bytes, &path)?;
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| ConvertError::Internal(format!("failed to write input: {e}")))?;
            debug!("materialized {} input bytes at {}", bytes.len(), path.display());
            Ok(AcquiredInput { path, owned: false })
        }
        InputArtifact::Url(url) => {
            let path = download_url(&url, workdir, config.download_timeout_secs).await?;
            Ok(AcquiredInput { path, owned: false })
        }
        InputArtifact::OwnedPath(path) => {
            validate_local(&path)?;
            Ok(AcquiredInput { path, owned: true })
        }
        InputArtifact::LocalPath(path) => {
            validate_local(&path)?;
            Ok(AcquiredInput { path, owned: false })
        }
    }
}

/// Validate that a local file exists and carries the PDF magic bytes.
fn validate_local(path: &Path) -> Result<(), ConvertError> {
    if !path.exists() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = std::fs::File::open(path).map_err(|e| ConvertError::SourceUnreadable {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_err() || &magic != b"%PDF" {
        return Err(ConvertError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("validated local PDF: {}", path.display());
    Ok(())
}

fn check_magic_bytes(bytes: &[u8], path: &Path) -> Result<(), ConvertError> {
    let mut magic = [0u8; 4];
    let len = bytes.len().min(4);
    magic[..len].copy_from_slice(&bytes[..len]);
    if &magic != b"%PDF" {
        return Err(ConvertError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }
    Ok(())
}

/// Download a URL into `workdir` and return the downloaded file's path.
async fn download_url(
    url: &str,
    workdir: &Path,
    timeout_secs: u64,
) -> Result<PathBuf, ConvertError> {
    info!("downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ConvertError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ConvertError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);
    let path = workdir.join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ConvertError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    check_magic_bytes(&bytes, &path)?;

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ConvertError::Internal(format!("failed to write download: {e}")))?;

    info!("downloaded to: {}", path.display());
    Ok(path)
}

/// Extract a reasonable filename from the URL path, defaulting to
/// `downloaded.pdf`.
pub fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
