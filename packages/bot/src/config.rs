//! The immutable settings of one run.

use std::path::PathBuf;
use std::time::Duration;

use traffic_watch_location::{ConfigError, DistrictSettings, Requirements, ValidatedLocation};
use traffic_watch_location_models::LocationsFile;
use traffic_watch_summary_models::SummaryMode;

use crate::paths::DataPaths;

/// Pause before each incident thread.
pub const POST_DELAY: Duration = Duration::from_secs(2);
/// Pause before the daily summary.
pub const SUMMARY_DELAY: Duration = Duration::from_secs(5);
/// Both pauses during a dry run.
pub const DRY_RUN_DELAY: Duration = Duration::from_millis(100);

/// What the operator asked for on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunOptions {
    /// Location id in the locations file.
    pub location: String,
    /// Attach satellite imagery.
    pub satellite: bool,
    /// Tag district representatives.
    pub representatives: bool,
    /// Neither post nor persist state.
    pub dry_run: bool,
    /// Fetch window in days.
    pub window_days: u32,
    /// Weekly/monthly counter bookkeeping.
    pub summary_mode: SummaryMode,
    /// Root of the archive and asset directories.
    pub data_dir: PathBuf,
}

/// Everything a run needs, validated up front and never mutated.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunConfig {
    /// The location, checked against the options below.
    pub location: ValidatedLocation,
    /// Attach satellite imagery.
    pub satellite: bool,
    /// Tag district representatives.
    pub representatives: bool,
    /// Neither post nor persist state.
    pub dry_run: bool,
    /// Fetch window in days.
    pub window_days: u32,
    /// Weekly/monthly counter bookkeeping.
    pub summary_mode: SummaryMode,
    /// Where state and assets live.
    pub paths: DataPaths,
    /// Pause before each incident thread.
    pub post_delay: Duration,
    /// Pause before the daily summary.
    pub summary_delay: Duration,
    /// Age after which a leftover run lock is reclaimed.
    pub lock_stale_after: Duration,
}

impl RunConfig {
    /// Validates `options` against the locations file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the location cannot support the options.
    pub fn new(options: RunOptions, file: &LocationsFile) -> Result<Self, ConfigError> {
        let location = traffic_watch_location::validate(
            file,
            &Requirements {
                location: &options.location,
                satellite: options.satellite,
                representatives: options.representatives,
                district_summary: options.summary_mode.tracks_districts(),
                dry_run: options.dry_run,
                window_days: options.window_days,
            },
        )?;

        let delay = |normal| if options.dry_run { DRY_RUN_DELAY } else { normal };

        Ok(Self {
            paths: DataPaths::new(&options.data_dir, &location.id),
            post_delay: delay(POST_DELAY),
            summary_delay: delay(SUMMARY_DELAY),
            lock_stale_after: traffic_watch_archive::DEFAULT_STALE_AFTER,
            location,
            satellite: options.satellite,
            representatives: options.representatives,
            dry_run: options.dry_run,
            window_days: options.window_days,
            summary_mode: options.summary_mode,
        })
    }

    /// Whether incidents need a district.
    #[must_use]
    pub const fn needs_districts(&self) -> bool {
        self.representatives || self.summary_mode.tracks_districts()
    }

    /// District settings, present whenever [`Self::needs_districts`].
    #[must_use]
    pub const fn districts(&self) -> Option<&DistrictSettings> {
        self.location.districts.as_ref()
    }

    /// Number of incidents to request from the feed.
    #[must_use]
    pub const fn fetch_limit(&self) -> u32 {
        self.location.feed.limit_per_day.saturating_mul(self.window_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCATIONS: &str = r#"
[locations.richmond]
display_name = "RVA"

[locations.richmond.bounds]
lower_latitude = 37.4
lower_longitude = -77.7
upper_latitude = 37.7
upper_longitude = -77.3
"#;

    fn options() -> RunOptions {
        RunOptions {
            location: "richmond".to_string(),
            satellite: false,
            representatives: false,
            dry_run: true,
            window_days: 3,
            summary_mode: SummaryMode::On,
            data_dir: PathBuf::from("/data"),
        }
    }

    #[test]
    fn dry_run_shortens_delays() {
        let file = traffic_watch_location::parse(LOCATIONS).unwrap();
        let config = RunConfig::new(options(), &file).unwrap();

        assert_eq!(config.post_delay, DRY_RUN_DELAY);
        assert_eq!(config.summary_delay, DRY_RUN_DELAY);
        assert_eq!(config.fetch_limit(), 600);
        assert!(!config.needs_districts());
        assert_eq!(
            config.paths.archive_file,
            PathBuf::from("/data/archive/seen-incidents-richmond.json")
        );
    }

    #[test]
    fn district_summary_requires_representatives() {
        let file = traffic_watch_location::parse(LOCATIONS).unwrap();
        let err = RunConfig::new(
            RunOptions {
                summary_mode: SummaryMode::Districts,
                ..options()
            },
            &file,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRepresentatives(_)));
    }
}
