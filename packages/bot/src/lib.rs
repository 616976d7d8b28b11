#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The traffic-watch bot: one sequential pass that fetches a city's recent
//! 911 incidents, keeps the traffic-violence ones it has not posted yet,
//! and publishes a thread per incident followed by a daily summary.

pub mod config;
pub mod images;
pub mod paths;
pub mod pipeline;
pub mod thread;

#[cfg(test)]
mod test_server;

pub use config::{RunConfig, RunOptions};
pub use pipeline::{RunReport, run};

/// Errors that end a run early.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] traffic_watch_location::ConfigError),

    /// The run lock or the archive could not be handled.
    #[error(transparent)]
    Archive(#[from] traffic_watch_archive::ArchiveError),

    /// The summary counters could not be read or written.
    #[error(transparent)]
    Summary(#[from] traffic_watch_summary::SummaryError),

    /// The incident feed could not be fetched.
    #[error("Failed to fetch incidents: {0}")]
    Feed(#[from] traffic_watch_source::SourceError),

    /// District boundaries could not be loaded.
    #[error(transparent)]
    District(#[from] traffic_watch_district::DistrictError),

    /// The asset directory could not be reset.
    #[error("Failed to reset asset directory {path}: {source}")]
    Assets {
        path: String,
        source: std::io::Error,
    },
}
