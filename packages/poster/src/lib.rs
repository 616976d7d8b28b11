#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Publishing threads of posts.
//!
//! A thread is an ordered list of [`Post`]s where each post after the
//! first replies to the one before it. [`XPoster`] publishes through the
//! X API v2; [`DryRunPoster`] only logs what would have been posted.

pub mod x;

#[cfg(test)]
pub(crate) mod test_server;

use std::path::PathBuf;

use async_trait::async_trait;

pub use x::XPoster;

/// Errors that can occur while publishing.
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API rejected a request.
    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for the API's error detail.
        body: String,
    },

    /// A media file could not be read.
    #[error("Failed to read media {path}: {source}")]
    Media {
        /// File path.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// A response did not have the expected shape.
    #[error("Unexpected response from {url}: {source}")]
    Decode {
        /// Request URL.
        url: String,
        /// The parse error.
        source: serde_json::Error,
    },
}

/// An image attached to a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    /// Local file to upload.
    pub path: PathBuf,
    /// Accessibility description.
    pub alt_text: String,
}

/// One post of a thread.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Post {
    /// Body text.
    pub text: String,
    /// Images attached in order; empty for text-only posts.
    pub media: Vec<MediaAttachment>,
}

impl Post {
    /// A text-only post.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media: Vec::new(),
        }
    }
}

/// Something that can publish a thread.
#[async_trait]
pub trait SocialPoster: Send + Sync {
    /// Publishes `posts` as a reply chain, in order. An empty slice
    /// publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PostError`] if any post fails. Posts published before the
    /// failure stay published.
    async fn post_thread(&self, posts: &[Post]) -> Result<(), PostError>;
}

/// Logs threads instead of publishing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunPoster;

#[async_trait]
impl SocialPoster for DryRunPoster {
    async fn post_thread(&self, posts: &[Post]) -> Result<(), PostError> {
        for (i, post) in posts.iter().enumerate() {
            log::info!("[dry run] post {}/{}:\n{}", i + 1, posts.len(), post.text);
            for media in &post.media {
                log::info!(
                    "[dry run]   media {} ({})",
                    media.path.display(),
                    media.alt_text
                );
            }
        }
        Ok(())
    }
}
