#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration for the locations the bot can run against.
//!
//! A locations file holds one `[locations.<id>]` table per city. Secrets
//! (the posting token and the Google key) live next to the geography so a
//! single file fully describes how to run a location.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Default incident feed host.
pub const DEFAULT_FEED_BASE_URL: &str = "https://citizen.com";

/// Default GeoJSON feature property holding a district's name.
pub const DEFAULT_DISTRICT_PROPERTY: &str = "NAME";

/// Top-level layout of the locations file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LocationsFile {
    /// Incident feed settings shared by every location.
    #[serde(default)]
    pub feed: FeedSettings,
    /// Locations keyed by the id passed to `--location`.
    #[serde(default)]
    pub locations: BTreeMap<String, LocationConfig>,
}

/// Where incidents are fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FeedSettings {
    /// Scheme and host of the feed API.
    #[serde(default = "default_feed_base_url")]
    pub base_url: String,
    /// Incidents requested per day of the window.
    #[serde(default = "default_limit_per_day")]
    pub limit_per_day: u32,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: default_feed_base_url(),
            limit_per_day: default_limit_per_day(),
        }
    }
}

fn default_feed_base_url() -> String {
    DEFAULT_FEED_BASE_URL.to_string()
}

const fn default_limit_per_day() -> u32 {
    200
}

/// A rectangular area in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BoundingBox {
    /// Southern edge.
    pub lower_latitude: f64,
    /// Western edge.
    pub lower_longitude: f64,
    /// Northern edge.
    pub upper_latitude: f64,
    /// Eastern edge.
    pub upper_longitude: f64,
}

impl BoundingBox {
    /// Whether the lower corner is strictly south-west of the upper one.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.lower_latitude < self.upper_latitude && self.lower_longitude < self.upper_longitude
    }
}

/// One city the bot posts about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LocationConfig {
    /// Name used in the "nothing happened" summary, e.g. "RVA".
    pub display_name: String,
    /// Area passed to the incident feed.
    pub bounds: BoundingBox,
    /// Offset from UTC, in minutes, used to render local timestamps and to
    /// decide which calendar day a run belongs to.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// OAuth 2.0 user access token for the posting account.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Google Static Maps API key, needed for satellite images.
    #[serde(default)]
    pub google_key: Option<String>,
    /// District boundaries and council members.
    #[serde(default)]
    pub representatives: Option<RepresentativeInfo>,
}

/// District boundaries and who represents each district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RepresentativeInfo {
    /// What a district is called in posts, e.g. "district" or "ward".
    #[serde(default)]
    pub district_term: Option<String>,
    /// URL of a GeoJSON `FeatureCollection` of district polygons.
    #[serde(default)]
    pub geojson_url: Option<String>,
    /// Feature property holding the district name.
    #[serde(default = "default_district_property")]
    pub district_property: String,
    /// Representative handle keyed by district name.
    #[serde(default)]
    pub members: BTreeMap<String, String>,
    /// City-wide members.
    #[serde(default)]
    pub at_large: Vec<String>,
}

fn default_district_property() -> String {
    DEFAULT_DISTRICT_PROPERTY.to_string()
}
