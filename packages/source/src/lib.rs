#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Network inputs of a run: the trending-incidents feed and the map
//! images attached to each post.
//!
//! The pipeline talks to the feed through the [`IncidentFeed`] trait so
//! tests can substitute an in-memory feed for [`FeedClient`].

pub mod download;
pub mod feed;
pub mod progress;

#[cfg(test)]
pub(crate) mod test_server;

use async_trait::async_trait;
use traffic_watch_incident_models::Incident;
use traffic_watch_location_models::BoundingBox;

pub use feed::FeedClient;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("traffic-watch/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur while talking to remote services.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error on a local file.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },
}

/// A source of recent incidents for an area.
#[async_trait]
pub trait IncidentFeed: Send + Sync {
    /// Fetches up to `limit` trending incidents inside `bounds`, in feed
    /// order. Records that do not parse are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails or the response is
    /// not a trending-incidents document.
    async fn fetch_incidents(
        &self,
        bounds: &BoundingBox,
        limit: u32,
    ) -> Result<Vec<Incident>, SourceError>;
}

/// Builds the shared HTTP client.
///
/// # Errors
///
/// Returns [`SourceError::Http`] if the TLS backend cannot be initialized.
pub fn http_client() -> Result<reqwest::Client, SourceError> {
    Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
}
