//! Job orchestration: one conversion request, end to end.
//!
//! ## State machine
//!
//! ```text
//! Received → Rasterizing → Normalizing → Assembling → Delivering → Cleanup → Done
//!     │           │            │             │            │
//!     └───────────┴────────────┴─────────────┴────────────┴──▶ Errored → Cleanup → Done
//! ```
//!
//! Stages run strictly in sequence for the single job; no stage starts until
//! the previous stage's full output is available. Any failure inside a
//! pipeline stage transitions directly to `Errored` — no partial output is
//! ever delivered.
//!
//! ## Cleanup is unconditional
//!
//! Cleanup removes the working directory (with every intermediate raster),
//! the assembled output document, and any owned input artifact, on every
//! exit path. Cleanup failures are logged with the `resource_cleanup`
//! classification and never replace the job's own outcome. If the job future
//! is dropped mid-flight (front-end timeout, task cancellation), the
//! [`ConversionJob`] drop guard performs the same cleanup, so cancelled jobs
//! leak nothing either.

use crate::config::ConversionConfig;
use crate::error::{ConvertError, DeliveryError, ErrorClass};
use crate::naming;
use crate::output::{JobSummary, OutputDocument, PageImage};
use crate::pipeline::raster::{PdfiumRasterizer, Rasterizer};
use crate::pipeline::{assemble, input, normalize};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

/// States a conversion job moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Input artifact in hand, output name reserved.
    Received,
    /// Rendering source pages to raster files.
    Rasterizing,
    /// Rescaling and recompressing page rasters.
    Normalizing,
    /// Embedding pages into the output document.
    Assembling,
    /// Handing the assembled document to the delivery collaborator.
    Delivering,
    /// Removing every artifact the job created.
    Cleanup,
    /// Terminal.
    Done,
    /// A pipeline stage failed; classification and message were recorded.
    Errored,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Received => "received",
            JobState::Rasterizing => "rasterizing",
            JobState::Normalizing => "normalizing",
            JobState::Assembling => "assembling",
            JobState::Delivering => "delivering",
            JobState::Cleanup => "cleanup",
            JobState::Done => "done",
            JobState::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// One conversion request as handed over by a front-end collaborator.
#[derive(Debug)]
pub struct JobRequest {
    /// Where the input PDF comes from.
    pub input: input::InputArtifact,
    /// The filename the caller declared for the input, if any. Drives the
    /// Naming Service; absent names fall back to a fixed placeholder.
    pub filename: Option<String>,
}

impl JobRequest {
    pub fn new(input: input::InputArtifact, filename: Option<String>) -> Self {
        Self { input, filename }
    }
}

/// Run one conversion job end to end.
///
/// Sequences input acquisition, rasterization, normalization, and assembly,
/// hands the assembled [`OutputDocument`] to `deliver`, and then removes
/// every artifact the job created — working directory, intermediate rasters,
/// output document, owned input — regardless of how the job ended.
///
/// `deliver` is the front-end's transmission step. It must copy the document
/// (or its bytes) somewhere of its own if it needs it past the call:
/// cleanup removes the file at `OutputDocument::path` as soon as `deliver`
/// returns. Returning [`DeliveryError::Timeout`] surfaces as the
/// `delivery_timeout` classification; cleanup still runs.
///
/// Wrapping the returned future in a timeout and dropping it is safe: the
/// job's drop guard cleans up on cancellation.
pub async fn run_job<F, Fut>(
    request: JobRequest,
    config: &ConversionConfig,
    deliver: F,
) -> Result<JobSummary, ConvertError>
where
    F: FnOnce(OutputDocument) -> Fut,
    Fut: Future<Output = Result<(), DeliveryError>>,
{
    let total_start = Instant::now();

    let workdir = TempDir::new()
        .map_err(|e| ConvertError::Internal(format!("failed to create working directory: {e}")))?;
    let (output_path, output_filename) =
        naming::reserve_output_path(&config.output_dir, request.filename.as_deref()).map_err(
            |e| ConvertError::OutputWriteFailed {
                path: config.output_dir.clone(),
                source: e,
            },
        )?;

    let mut job = ConversionJob {
        workdir: Some(workdir),
        output_path,
        output_filename,
        owned_input: None,
        state: JobState::Received,
        config: config.clone(),
        cleaned: false,
    };
    job.notify(JobState::Received);
    info!(
        "job received: {:?} → '{}'",
        request.input, job.output_filename
    );

    let result = job.run_pipeline(request, deliver, total_start).await;
    if let Err(ref e) = result {
        job.fail(e);
    }

    job.enter(JobState::Cleanup);
    job.cleanup();
    job.enter(JobState::Done);

    result
}

/// One in-flight conversion job and the artifacts it owns.
struct ConversionJob {
    /// Working directory holding the input copy and per-page rasters.
    /// `Some` until cleanup releases it.
    workdir: Option<TempDir>,
    /// Reserved output document path in the target namespace.
    output_path: PathBuf,
    /// Collision-free output filename.
    output_filename: String,
    /// Input file outside the working directory that the job must delete.
    owned_input: Option<PathBuf>,
    state: JobState,
    config: ConversionConfig,
    cleaned: bool,
}

impl ConversionJob {
    async fn run_pipeline<F, Fut>(
        &mut self,
        request: JobRequest,
        deliver: F,
        total_start: Instant,
    ) -> Result<JobSummary, ConvertError>
    where
        F: FnOnce(OutputDocument) -> Fut,
        Fut: Future<Output = Result<(), DeliveryError>>,
    {
        let workdir_path = self.workdir_path()?;
        let config = self.config.clone();

        let acquired = input::acquire(request.input, &workdir_path, &config).await?;
        if acquired.owned {
            self.owned_input = Some(acquired.path.clone());
        }

        // ── Rasterizing ──────────────────────────────────────────────────
        self.enter(JobState::Rasterizing);
        let raster_start = Instant::now();
        let rasterizer: Arc<dyn Rasterizer> = config
            .rasterizer
            .clone()
            .unwrap_or_else(|| Arc::new(PdfiumRasterizer));
        let pages: Vec<PageImage> = {
            let rasterizer = Arc::clone(&rasterizer);
            let pdf = acquired.path.clone();
            let dir = workdir_path.clone();
            let cfg = config.clone();
            tokio::task::spawn_blocking(move || rasterizer.rasterize(&pdf, &dir, &cfg))
                .await
                .map_err(|e| ConvertError::Internal(format!("raster task panicked: {e}")))??
        };
        let raster_duration_ms = raster_start.elapsed().as_millis() as u64;
        info!("rasterized {} pages in {}ms", pages.len(), raster_duration_ms);

        // ── Normalizing ──────────────────────────────────────────────────
        self.enter(JobState::Normalizing);
        let normalize_start = Instant::now();
        let normalized: Vec<PageImage> = {
            let cfg = config.clone();
            tokio::task::spawn_blocking(move || {
                pages
                    .iter()
                    .map(|p| normalize::normalize_page(p, &cfg))
                    .collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(|e| ConvertError::Internal(format!("normalize task panicked: {e}")))??
        };
        let normalize_duration_ms = normalize_start.elapsed().as_millis() as u64;

        // ── Assembling ───────────────────────────────────────────────────
        self.enter(JobState::Assembling);
        let assemble_start = Instant::now();
        let page_count = normalized.len();
        {
            let cfg = config.clone();
            let out = self.output_path.clone();
            tokio::task::spawn_blocking(move || assemble::assemble(&normalized, &out, &cfg))
                .await
                .map_err(|e| ConvertError::Internal(format!("assemble task panicked: {e}")))??
        };
        let assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;

        // ── Delivering ───────────────────────────────────────────────────
        self.enter(JobState::Delivering);
        let document = OutputDocument {
            path: self.output_path.clone(),
            filename: self.output_filename.clone(),
            page_count,
        };
        deliver(document).await.map_err(|e| match e {
            DeliveryError::Timeout { secs } => ConvertError::DeliveryTimeout { secs },
            DeliveryError::Transport(detail) => ConvertError::DeliveryFailed { detail },
        })?;

        let summary = JobSummary {
            output_filename: self.output_filename.clone(),
            page_count,
            raster_duration_ms,
            normalize_duration_ms,
            assemble_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "job delivered: '{}', {} pages, {}ms",
            summary.output_filename, summary.page_count, summary.total_duration_ms
        );
        Ok(summary)
    }

    fn workdir_path(&self) -> Result<PathBuf, ConvertError> {
        self.workdir
            .as_ref()
            .map(|d| d.path().to_path_buf())
            .ok_or_else(|| ConvertError::Internal("working directory already released".into()))
    }

    /// Transition to `state`, logging and notifying the progress callback.
    fn enter(&mut self, state: JobState) {
        debug!("job state: {} → {}", self.state, state);
        self.state = state;
        self.notify(state);
    }

    fn notify(&self, state: JobState) {
        if let Some(ref cb) = self.config.progress {
            cb.on_state(state);
        }
    }

    /// Record the failure and move to `Errored`.
    fn fail(&mut self, err: &ConvertError) {
        error!(class = %err.classification(), "job failed: {err}");
        self.enter(JobState::Errored);
    }

    /// Remove every artifact the job created. Never fails: individual
    /// removal errors are logged with the `resource_cleanup` classification
    /// and do not affect the job's outcome.
    fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;

        remove_artifact(&self.output_path);
        if let Some(input) = self.owned_input.take() {
            remove_artifact(&input);
        }
        if let Some(workdir) = self.workdir.take() {
            let path = workdir.path().to_path_buf();
            if let Err(e) = workdir.close() {
                warn!(
                    class = %ErrorClass::ResourceCleanup,
                    "failed to remove working directory '{}': {e}",
                    path.display()
                );
            }
        }
    }
}

impl Drop for ConversionJob {
    fn drop(&mut self) {
        if !self.cleaned {
            debug!("job dropped before cleanup (cancelled or timed out)");
            self.cleanup();
        }
    }
}

fn remove_artifact(path: &Path) {
    if !path.exists() {
        return;
    }
    if let Err(e) = std::fs::remove_file(path) {
        warn!(
            class = %ErrorClass::ResourceCleanup,
            "failed to remove '{}': {e}",
            path.display()
        );
    }
}
