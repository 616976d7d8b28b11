#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reads the locations file and checks that a location has everything the
//! requested run options need, before any network activity happens.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::FixedOffset;
use traffic_watch_location_models::{
    BoundingBox, FeedSettings, LocationConfig, LocationsFile, RepresentativeInfo,
};

/// Errors that make a run impossible to start.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The locations file could not be read.
    #[error("Failed to read locations file {path}: {source}")]
    Read {
        /// File path.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The locations file is not valid TOML or has the wrong shape.
    #[error("Failed to parse locations file: {0}")]
    Parse(#[from] toml::de::Error),

    /// `--location` names a location that is not configured.
    #[error("Unknown location '{location}' (configured: {known})")]
    UnknownLocation {
        /// Requested id.
        location: String,
        /// Comma-separated configured ids.
        known: String,
    },

    /// Satellite images were requested but no Google key is configured.
    #[error("Location '{0}' needs a google_key for satellite images")]
    MissingGoogleKey(String),

    /// Representatives or district summaries need a `representatives`
    /// table.
    #[error("Location '{0}' has no representatives table")]
    MissingRepresentatives(String),

    /// A required representatives field is missing.
    #[error("Location '{location}' representatives table is missing {field}")]
    MissingRepresentativeField {
        /// Location id.
        location: String,
        /// Name of the missing key.
        field: &'static str,
    },

    /// Posting for real requires an access token.
    #[error("Location '{0}' needs an access_token unless running with --dry-run")]
    MissingAccessToken(String),

    /// The configured UTC offset is out of range.
    #[error("Location '{location}' has an invalid utc_offset_minutes: {minutes}")]
    InvalidUtcOffset {
        /// Location id.
        location: String,
        /// Configured value.
        minutes: i32,
    },

    /// The bounding box corners are swapped or degenerate.
    #[error("Location '{0}' has a malformed bounding box")]
    InvalidBounds(String),

    /// The fetch window must cover at least one day.
    #[error("--days must be at least 1")]
    InvalidWindow,
}

/// Reads and parses a locations file.
///
/// # Errors
///
/// * [`ConfigError::Read`] if the file cannot be read
/// * [`ConfigError::Parse`] if it is not a valid locations file
pub fn load(path: &Path) -> Result<LocationsFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let file = parse(&contents)?;
    log::debug!(
        "Loaded {} location(s) from {}",
        file.locations.len(),
        path.display()
    );
    Ok(file)
}

/// Parses the contents of a locations file.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is invalid.
pub fn parse(contents: &str) -> Result<LocationsFile, ConfigError> {
    Ok(toml::from_str(contents)?)
}

/// Run options that place requirements on the location config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Requirements<'a> {
    /// Location id from `--location`.
    pub location: &'a str,
    /// Satellite images will be attached.
    pub satellite: bool,
    /// Representatives will be tagged.
    pub representatives: bool,
    /// Summary counters will be broken down by district.
    pub district_summary: bool,
    /// Nothing will be posted.
    pub dry_run: bool,
    /// Fetch window in days.
    pub window_days: u32,
}

/// District settings with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictSettings {
    /// What a district is called in posts.
    pub district_term: String,
    /// Boundary GeoJSON URL.
    pub geojson_url: String,
    /// Feature property holding the district name.
    pub district_property: String,
    /// Representative handle keyed by district name.
    pub members: BTreeMap<String, String>,
    /// City-wide members.
    pub at_large: Vec<String>,
}

impl DistrictSettings {
    /// Representative for `district`, if configured.
    #[must_use]
    pub fn member_for(&self, district: &str) -> Option<&str> {
        self.members.get(district).map(String::as_str)
    }
}

/// A location that passed validation for a particular set of run options.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLocation {
    /// Location id.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Feed area.
    pub bounds: BoundingBox,
    /// Local time offset.
    pub utc_offset: FixedOffset,
    /// Posting token; `None` only for dry runs.
    pub access_token: Option<String>,
    /// Present when satellite images were requested.
    pub google_key: Option<String>,
    /// Present when representatives or district summaries were requested.
    pub districts: Option<DistrictSettings>,
    /// Feed settings from the file.
    pub feed: FeedSettings,
}

/// Checks that `file` can satisfy `req` and returns the resolved location.
///
/// # Errors
///
/// Returns the first [`ConfigError`] found.
pub fn validate(file: &LocationsFile, req: &Requirements<'_>) -> Result<ValidatedLocation, ConfigError> {
    if req.window_days == 0 {
        return Err(ConfigError::InvalidWindow);
    }

    let id = req.location;
    let config = file
        .locations
        .get(id)
        .ok_or_else(|| ConfigError::UnknownLocation {
            location: id.to_string(),
            known: file.locations.keys().cloned().collect::<Vec<_>>().join(", "),
        })?;

    if !config.bounds.is_well_formed() {
        return Err(ConfigError::InvalidBounds(id.to_string()));
    }

    let utc_offset = utc_offset(id, config)?;

    let google_key = if req.satellite {
        Some(
            non_blank(config.google_key.as_ref())
                .ok_or_else(|| ConfigError::MissingGoogleKey(id.to_string()))?,
        )
    } else {
        None
    };

    let districts = if req.representatives || req.district_summary {
        let info = config
            .representatives
            .as_ref()
            .ok_or_else(|| ConfigError::MissingRepresentatives(id.to_string()))?;
        Some(district_settings(id, info)?)
    } else {
        None
    };

    let access_token = non_blank(config.access_token.as_ref());
    if access_token.is_none() && !req.dry_run {
        return Err(ConfigError::MissingAccessToken(id.to_string()));
    }

    Ok(ValidatedLocation {
        id: id.to_string(),
        display_name: config.display_name.clone(),
        bounds: config.bounds,
        utc_offset,
        access_token,
        google_key,
        districts,
        feed: file.feed.clone(),
    })
}

fn utc_offset(id: &str, config: &LocationConfig) -> Result<FixedOffset, ConfigError> {
    config
        .utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| ConfigError::InvalidUtcOffset {
            location: id.to_string(),
            minutes: config.utc_offset_minutes,
        })
}

fn district_settings(id: &str, info: &RepresentativeInfo) -> Result<DistrictSettings, ConfigError> {
    let missing = |field| ConfigError::MissingRepresentativeField {
        location: id.to_string(),
        field,
    };
    Ok(DistrictSettings {
        district_term: non_blank(info.district_term.as_ref()).ok_or_else(|| missing("district_term"))?,
        geojson_url: non_blank(info.geojson_url.as_ref()).ok_or_else(|| missing("geojson_url"))?,
        district_property: info.district_property.clone(),
        members: info.members.clone(),
        at_large: info.at_large.clone(),
    })
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}
