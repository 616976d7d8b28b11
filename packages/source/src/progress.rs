//! Progress reporting for the posting loop.
//!
//! The pipeline reports through [`ProgressCallback`] so it does not care
//! whether a terminal progress bar, a log line, or nothing is rendered.

use std::sync::Arc;

/// Receives progress updates from a run.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of incidents that will be posted.
    fn set_total(&self, total: u64);

    /// Advances by `delta` incidents.
    fn inc(&self, delta: u64);

    /// Shows what is currently being worked on.
    fn set_message(&self, msg: String);

    /// Ends the progress display.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
