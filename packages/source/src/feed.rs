//! HTTP client for the trending-incidents endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use traffic_watch_incident_models::Incident;
use traffic_watch_location_models::BoundingBox;

use crate::{IncidentFeed, SourceError};

/// Path of the trending endpoint below the feed host.
pub const TRENDING_PATH: &str = "/api/incident/trending";

#[derive(Debug, Deserialize)]
struct TrendingResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

/// Fetches incidents from a Citizen-compatible feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
}

impl FeedClient {
    /// Creates a client for the feed hosted at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Full request URL for `bounds` and `limit`.
    #[must_use]
    pub fn trending_url(&self, bounds: &BoundingBox, limit: u32) -> String {
        format!(
            "{}{TRENDING_PATH}?lowerLatitude={}&lowerLongitude={}&upperLatitude={}&upperLongitude={}&fullResponse=true&limit={limit}",
            self.base_url,
            bounds.lower_latitude,
            bounds.lower_longitude,
            bounds.upper_latitude,
            bounds.upper_longitude,
        )
    }
}

#[async_trait]
impl IncidentFeed for FeedClient {
    async fn fetch_incidents(
        &self,
        bounds: &BoundingBox,
        limit: u32,
    ) -> Result<Vec<Incident>, SourceError> {
        let url = self.trending_url(bounds, limit);
        log::info!("Fetching trending incidents: {url}");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        let incidents = parse_trending(&body)?;
        log::info!("Feed returned {} incident(s)", incidents.len());
        Ok(incidents)
    }
}

/// Parses a trending response body, skipping records that are not valid
/// incidents.
///
/// # Errors
///
/// Returns [`SourceError::Json`] if the body itself is not JSON of the
/// expected shape.
pub fn parse_trending(body: &str) -> Result<Vec<Incident>, SourceError> {
    let response: TrendingResponse = serde_json::from_str(body)?;

    Ok(response
        .results
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value::<Incident>(value) {
            Ok(incident) => Some(incident),
            Err(e) => {
                log::warn!("Skipping malformed feed record #{i}: {e}");
                None
            }
        })
        .collect())
}
