#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Cross-run deduplication for posted incidents.
//!
//! Every incident the bot processes is appended to a per-location JSON
//! archive of [`SeenIncidentRecord`]s. On the next run, [`dedupe`] drops
//! anything whose key is already archived. The archive is append-only and
//! is read fail-open: a missing or corrupt file behaves like an empty one.
//!
//! [`RunLock`] keeps two scheduled invocations for the same location from
//! reading and writing the archive (and the summary counters) at once.
//!
//! [`SeenIncidentRecord`]: traffic_watch_incident_models::SeenIncidentRecord

pub mod atomic;
pub mod dedupe;
pub mod lock;
pub mod store;

pub use dedupe::{DedupeOutcome, dedupe, dedupe_by};
pub use lock::{DEFAULT_STALE_AFTER, RunLock};
pub use store::ArchiveStore;

/// Errors that can occur while persisting the archive or taking the lock.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// I/O error on a specific file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file being read or written.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Another run holds the lock.
    #[error("Another run holds the lock at {path} ({holder})")]
    Locked {
        /// Lock file path.
        path: String,
        /// Contents of the lock file, identifying the holder.
        holder: String,
    },
}
