//! Progress-callback trait for job state transitions.
//!
//! Inject an `Arc<dyn JobProgress>` via
//! [`crate::config::ConversionConfigBuilder::progress`] to receive
//! coarse-grained events as the orchestrator moves a job through its states.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a chat message edit, a Tokio broadcast channel, or a
//! terminal spinner without the library knowing anything about how the host
//! application communicates. Events are advisory — a front-end that ignores
//! them loses nothing but status text.

use crate::job::JobState;

/// Called by the orchestrator on every job state transition.
///
/// Implementations must be `Send + Sync`: the surrounding front-end may host
/// many jobs concurrently and share one callback across them. The single
/// method has a default no-op implementation.
pub trait JobProgress: Send + Sync {
    /// Called when the job enters `state`.
    ///
    /// Transitions arrive in machine order (`Received`, `Rasterizing`, …,
    /// `Done`), with `Errored` replacing the remaining pipeline states on
    /// failure.
    fn on_state(&self, state: JobState) {
        let _ = state;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopJobProgress;

impl JobProgress for NoopJobProgress {}
