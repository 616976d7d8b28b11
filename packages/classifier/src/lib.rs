#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Traffic-violence classification for feed incidents.
//!
//! Maps each [`Incident`] to a [`Verdict`] using the keyword
//! [`rules::RULES`] table. Matching is case-insensitive and purely lexical:
//! "no pedestrian involved" still matches "pedestrian".

pub mod rules;

use traffic_watch_incident_models::{Incident, TrackedIncident, Verdict};

use crate::rules::{RULES, RuleTable, TextScope, contains_any};

/// Milliseconds in one day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Classifies an incident against the production rule table.
#[must_use]
pub fn classify(incident: &Incident) -> Verdict {
    classify_with(&RULES, incident)
}

/// Classifies an incident against an arbitrary rule table.
///
/// A veto term anywhere in `raw` or `title` makes the incident irrelevant.
/// Otherwise the first rule with at least one matching field in its scope
/// decides the verdict.
#[must_use]
pub fn classify_with(table: &RuleTable, incident: &Incident) -> Verdict {
    let top_level: Vec<String> = incident.top_level_texts().map(str::to_lowercase).collect();

    if top_level
        .iter()
        .any(|text| contains_any(text, table.veto_terms))
    {
        return Verdict::Irrelevant;
    }

    let updates: Vec<String> = incident
        .updates
        .iter()
        .map(|(_, update)| update.text.to_lowercase())
        .collect();

    table
        .rules
        .iter()
        .find(|rule| {
            let texts = match rule.scope {
                TextScope::TopLevel => &top_level,
                TextScope::Updates => &updates,
            };
            texts.iter().any(|text| rule.matches_text(text))
        })
        .map_or(Verdict::Irrelevant, |rule| rule.verdict)
}

/// Keeps incidents whose timestamp falls within the last `window_days`
/// days relative to `now_ms`.
#[must_use]
pub fn within_window(incidents: Vec<Incident>, now_ms: i64, window_days: u32) -> Vec<Incident> {
    let cutoff = now_ms - MS_PER_DAY * i64::from(window_days);
    incidents.into_iter().filter(|x| x.ts >= cutoff).collect()
}

/// Relevant incidents split by verdict, each bucket in feed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    /// Incidents involving pedestrians, cyclists, or scooters.
    pub pedestrian_or_cyclist: Vec<Incident>,
    /// Vehicle-only collisions.
    pub vehicle_only: Vec<Incident>,
}

impl Partition {
    /// Total number of relevant incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pedestrian_or_cyclist.len() + self.vehicle_only.len()
    }

    /// Whether no incident was relevant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens into the posting order: vehicle-only first, then
    /// pedestrian/cyclist incidents, so the latter end up nearer the top
    /// of the timeline.
    #[must_use]
    pub fn into_tracked(self) -> Vec<TrackedIncident> {
        self.vehicle_only
            .into_iter()
            .map(|x| TrackedIncident::new(x, Verdict::VehicleOnly))
            .chain(
                self.pedestrian_or_cyclist
                    .into_iter()
                    .map(|x| TrackedIncident::new(x, Verdict::PedestrianOrCyclist)),
            )
            .collect()
    }
}

/// Classifies a batch and drops irrelevant incidents.
#[must_use]
pub fn partition(incidents: Vec<Incident>) -> Partition {
    let total = incidents.len();
    let mut result = Partition::default();

    for incident in incidents {
        match classify(&incident) {
            Verdict::PedestrianOrCyclist => result.pedestrian_or_cyclist.push(incident),
            Verdict::VehicleOnly => result.vehicle_only.push(incident),
            Verdict::Irrelevant => {
                log::trace!("Skipping irrelevant incident {}", incident.key);
            }
        }
    }

    log::info!(
        "Classified {total} incident(s): {} pedestrian/cyclist, {} vehicle-only (rules v{})",
        result.pedestrian_or_cyclist.len(),
        result.vehicle_only.len(),
        RULES.version,
    );

    result
}
