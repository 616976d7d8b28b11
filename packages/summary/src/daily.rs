//! The summary thread posted at the end of every run.

use std::collections::BTreeSet;

use traffic_watch_incident_models::{TrackedIncident, Verdict};

use crate::format::{format_list, pluralize};

/// Second post of a non-empty daily summary.
pub const DISCLAIMER: &str = "Disclaimer: This bot posts incidents called into 911 and is not \
                              representative of all traffic violence that occurred.";

/// Representative details added to the daily summary.
#[derive(Debug, Clone, Copy)]
pub struct RepresentativeContext<'a> {
    /// What a district is called, e.g. "district".
    pub district_term: &'a str,
    /// Members elected city-wide, listed in their own post.
    pub at_large: &'a [String],
}

/// Inputs for [`daily_summary`].
#[derive(Debug, Clone, Copy)]
pub struct DailySummary<'a> {
    /// Size of the fetch window in days.
    pub window_days: u32,
    /// Location name used when nothing happened.
    pub location_name: &'a str,
    /// Present when representatives are enabled.
    pub representatives: Option<RepresentativeContext<'a>>,
}

/// Builds the posts of the daily summary thread for this run's incidents.
#[must_use]
pub fn daily_summary(incidents: &[TrackedIncident], options: &DailySummary<'_>) -> Vec<String> {
    let total = incidents.len() as u64;

    if total == 0 {
        return vec![format!(
            "There were no incidents of traffic violence reported to 911 today in the {} area.",
            options.location_name
        )];
    }

    let pedestrian = incidents
        .iter()
        .filter(|x| x.verdict == Verdict::PedestrianOrCyclist)
        .count();
    let window = if options.window_days == 1 {
        "24 hours".to_string()
    } else {
        format!("{} days", options.window_days)
    };

    let mut first = format!(
        "There {} {total} {} of traffic violence found over the last {window}. \
         Of these, {pedestrian} involved pedestrians or cyclists.",
        pluralize(total, "was", "were"),
        pluralize(total, "incident", "incidents"),
    );

    let mut posts = Vec::with_capacity(3);

    if let Some(reps) = options.representatives {
        let districts: BTreeSet<&str> = incidents
            .iter()
            .filter_map(|x| x.district.as_deref())
            .collect();
        if !districts.is_empty() {
            let districts: Vec<&str> = districts.into_iter().collect();
            let term = if districts.len() == 1 {
                reps.district_term.to_string()
            } else {
                format!("{}s", reps.district_term)
            };
            first.push_str(&format!(
                "\n\n{} {term} {}.",
                pluralize(total, "The crash occurred in", "The crashes occurred in"),
                format_list(&districts),
            ));
        }
    }

    posts.push(first);
    posts.push(DISCLAIMER.to_string());

    if let Some(reps) = options.representatives
        && !reps.at_large.is_empty()
    {
        posts.push(format!(
            "At large city council representatives and president: {}",
            format_list(reps.at_large)
        ));
    }

    posts
}
