#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Types for the running weekly and monthly incident tallies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Which calendar period a set of counters covers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Period {
    /// Sunday through Saturday.
    Week,
    /// Calendar month.
    Month,
}

/// How much summary bookkeeping a run does.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SummaryMode {
    /// Counters are neither read nor written.
    #[default]
    Off,
    /// Totals only.
    On,
    /// Totals plus a per-district breakdown.
    Districts,
}

impl SummaryMode {
    /// Whether counters are maintained at all.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Whether incidents are also tallied by district.
    #[must_use]
    pub const fn tracks_districts(self) -> bool {
        matches!(self, Self::Districts)
    }
}

/// Counters for one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateCounters {
    /// Incidents recorded since the last reset.
    pub total: u64,
    /// Incidents per resolved district since the last reset.
    pub districts: BTreeMap<String, u64>,
}

impl AggregateCounters {
    /// Adds `count` incidents to the total.
    pub const fn add_total(&mut self, count: u64) {
        self.total += count;
    }

    /// Adds one incident to `district`'s tally.
    pub fn bump_district(&mut self, district: &str) {
        *self.districts.entry(district.to_string()).or_default() += 1;
    }

    /// Districts sharing the highest tally, sorted by name, with that
    /// tally. `None` when no district has been counted.
    #[must_use]
    pub fn leading_districts(&self) -> Option<(Vec<&str>, u64)> {
        let max = self.districts.values().copied().max()?;
        let names = self
            .districts
            .iter()
            .filter(|(_, count)| **count == max)
            .map(|(name, _)| name.as_str())
            .collect();
        Some((names, max))
    }

    /// Zeroes the total and clears the breakdown.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Everything persisted in the summary file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryState {
    /// Counters for the current week.
    pub week: AggregateCounters,
    /// Counters for the current month.
    pub month: AggregateCounters,
}

impl SummaryState {
    /// Mutable counters for `period`.
    pub const fn counters_mut(&mut self, period: Period) -> &mut AggregateCounters {
        match period {
            Period::Week => &mut self.week,
            Period::Month => &mut self.month,
        }
    }

    /// Counters for `period`.
    #[must_use]
    pub const fn counters(&self, period: Period) -> &AggregateCounters {
        match period {
            Period::Week => &self.week,
            Period::Month => &self.month,
        }
    }
}
