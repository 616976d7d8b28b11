#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Periodic incident tallies.
//!
//! Each run adds its newly posted incidents to running week and month
//! counters. When the run falls on the last day of a period the counters
//! are turned into a rollup message and reset. The daily summary thread
//! posted at the end of every run lives in [`daily`].

pub mod daily;
pub mod format;
pub mod store;

use chrono::{Datelike as _, Days, NaiveDate};
use traffic_watch_incident_models::TrackedIncident;
use traffic_watch_summary_models::{Period, SummaryState};

pub use store::SummaryStore;

use crate::format::{format_list, incident_count, pluralize};

/// Weekday index (Sunday = 0) on which the weekly rollup fires.
pub const WEEK_ROLLUP_WEEKDAY: u32 = 6;

/// Errors from loading or saving the summary counters.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    /// The counters file exists but could not be read.
    #[error("Failed to read summary counters {path}: {source}")]
    Read {
        /// File path.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The counters file is not valid JSON.
    #[error("Summary counters {path} are corrupt: {source}")]
    Corrupt {
        /// File path.
        path: String,
        /// The parse error.
        source: serde_json::Error,
    },

    /// Serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The atomic write failed.
    #[error(transparent)]
    Write(#[from] traffic_watch_archive::ArchiveError),
}

/// Knobs for [`record_and_maybe_rollup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupOptions {
    /// Also tally incidents per resolved district.
    pub breakdown: bool,
    /// What a district is called, e.g. "district" or "ward".
    pub district_term: String,
}

impl Default for RollupOptions {
    fn default() -> Self {
        Self {
            breakdown: false,
            district_term: "district".to_string(),
        }
    }
}

/// Result of [`record_and_maybe_rollup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupOutcome {
    /// Counters to persist.
    pub state: SummaryState,
    /// One message per period that ended today, week first.
    pub messages: Vec<String>,
}

/// Whether `today` is the last day of the week.
#[must_use]
pub fn is_week_end(today: NaiveDate) -> bool {
    today.weekday().num_days_from_sunday() == WEEK_ROLLUP_WEEKDAY
}

/// Whether `today` is the last day of its month.
#[must_use]
pub fn is_month_end(today: NaiveDate) -> bool {
    today
        .checked_add_days(Days::new(1))
        .is_some_and(|tomorrow| tomorrow.day() == 1)
}

/// Adds `incidents` to both periods and rolls over any period that ends
/// on `today`.
///
/// The returned state still has to be persisted by the caller.
#[must_use]
pub fn record_and_maybe_rollup(
    mut state: SummaryState,
    incidents: &[TrackedIncident],
    today: NaiveDate,
    options: &RollupOptions,
) -> RollupOutcome {
    let count = incidents.len() as u64;

    for period in [Period::Week, Period::Month] {
        let counters = state.counters_mut(period);
        counters.add_total(count);
        if options.breakdown {
            for district in incidents.iter().filter_map(|x| x.district.as_deref()) {
                counters.bump_district(district);
            }
        }
    }

    let mut messages = Vec::new();
    for (period, ends_today) in [
        (Period::Week, is_week_end(today)),
        (Period::Month, is_month_end(today)),
    ] {
        if !ends_today {
            continue;
        }
        messages.push(rollup_message(&state, period, options));
        log::info!(
            "Rolling over {period} counters at {today} (total {})",
            state.counters(period).total
        );
        state.counters_mut(period).reset();
    }

    RollupOutcome { state, messages }
}

/// Text of the rollup for `period`, built from its pre-reset counters.
#[must_use]
pub fn rollup_message(state: &SummaryState, period: Period, options: &RollupOptions) -> String {
    let counters = state.counters(period);
    let mut message = if counters.total == 0 {
        format!("There were no incidents of traffic violence reported to 911 this {period}.")
    } else {
        format!(
            "There {} {} of traffic violence reported to 911 this {period}.",
            pluralize(counters.total, "was", "were"),
            incident_count(counters.total),
        )
    };

    if options.breakdown
        && let Some((leaders, max)) = counters.leading_districts()
    {
        let term = if leaders.len() == 1 {
            options.district_term.clone()
        } else {
            format!("{}s", options.district_term)
        };
        message.push_str(&format!(
            "\n\nThe most incidents occurred in {term} {} with {}.",
            format_list(&leaders),
            incident_count(max),
        ));
    }

    message
}
