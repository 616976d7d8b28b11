//! Set-based deduplication against the archive.

use std::collections::BTreeSet;

use traffic_watch_incident_models::{Incident, SeenIncidentRecord};

/// Result of [`dedupe`] and [`dedupe_by`].
#[derive(Debug, Clone, PartialEq)]
pub struct DedupeOutcome<T = Incident> {
    /// Unseen candidates with a non-empty description, in input order.
    pub to_process: Vec<T>,
    /// The input archive followed by projections of `to_process`.
    pub updated_archive: Vec<SeenIncidentRecord>,
}

/// Drops candidates whose key is already archived (or repeated earlier in
/// the same batch) and candidates without a description, then appends the
/// survivors to the archive.
///
/// Running this again with the same candidates and the returned
/// `updated_archive` yields an empty `to_process`.
#[must_use]
pub fn dedupe(candidates: Vec<Incident>, archive: Vec<SeenIncidentRecord>) -> DedupeOutcome {
    dedupe_by(candidates, archive, |x| x)
}

/// [`dedupe`] over any wrapper around an [`Incident`], such as a
/// classified incident that must keep its verdict.
#[must_use]
pub fn dedupe_by<T>(
    candidates: Vec<T>,
    archive: Vec<SeenIncidentRecord>,
    incident: impl Fn(&T) -> &Incident,
) -> DedupeOutcome<T> {
    let mut seen: BTreeSet<String> = archive.iter().map(|r| r.key.clone()).collect();
    let mut to_process = Vec::new();
    let mut blank = 0_usize;
    let mut duplicates = 0_usize;

    for candidate in candidates {
        let x = incident(&candidate);
        if !x.has_description() {
            blank += 1;
            continue;
        }
        if !seen.insert(x.key.clone()) {
            duplicates += 1;
            continue;
        }
        to_process.push(candidate);
    }

    if blank > 0 {
        log::warn!("Dropped {blank} incident(s) with no description");
    }
    log::info!(
        "{} new incident(s), {duplicates} already seen, {} archived before this run",
        to_process.len(),
        archive.len(),
    );

    let mut updated_archive = archive;
    updated_archive.extend(
        to_process
            .iter()
            .map(|candidate| SeenIncidentRecord::from(incident(candidate))),
    );

    DedupeOutcome {
        to_process,
        updated_archive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use traffic_watch_incident_models::IncidentUpdates;

    fn incident(key: &str, raw: Option<&str>) -> Incident {
        Incident {
            key: key.to_string(),
            raw: raw.map(str::to_string),
            title: None,
            ts: 1_671_140_938_298,
            latitude: Some(37.5),
            longitude: Some(-77.4),
            address: None,
            share_map: Some(format!("https://example.com/{key}.png")),
            ll: None,
            updates: IncidentUpdates::default(),
        }
    }

    fn keys(incidents: &[Incident]) -> Vec<&str> {
        incidents.iter().map(|x| x.key.as_str()).collect()
    }

    #[test]
    fn everything_is_new_against_empty_archive() {
        let outcome = dedupe(
            vec![
                incident("a", Some("Pedestrian struck")),
                incident("b", Some("Vehicle collision")),
            ],
            Vec::new(),
        );
        assert_eq!(keys(&outcome.to_process), vec!["a", "b"]);
        assert_eq!(outcome.updated_archive.len(), 2);
        assert_eq!(outcome.updated_archive[0].key, "a");
        assert_eq!(
            outcome.updated_archive[1].map_image_url.as_deref(),
            Some("https://example.com/b.png")
        );
    }

    #[test]
    fn second_run_is_idempotent() {
        let batch = vec![
            incident("a", Some("Pedestrian struck")),
            incident("b", Some("Cyclist struck")),
        ];
        let first = dedupe(batch.clone(), Vec::new());
        let second = dedupe(batch, first.updated_archive.clone());

        assert!(second.to_process.is_empty());
        assert_eq!(second.updated_archive, first.updated_archive);
    }

    #[test]
    fn skips_archived_keys_and_keeps_archive_prefix() {
        let archived = vec![SeenIncidentRecord::from(&incident("a", Some("old")))];
        let outcome = dedupe(
            vec![incident("a", Some("old")), incident("c", Some("new"))],
            archived.clone(),
        );
        assert_eq!(keys(&outcome.to_process), vec!["c"]);
        assert_eq!(outcome.updated_archive[..1], archived[..]);
        assert_eq!(outcome.updated_archive.len(), 2);
    }

    #[test]
    fn drops_records_without_description() {
        let outcome = dedupe(
            vec![
                incident("a", None),
                incident("b", Some("")),
                incident("c", Some("Pedestrian struck")),
            ],
            Vec::new(),
        );
        assert_eq!(keys(&outcome.to_process), vec!["c"]);
        assert_eq!(outcome.updated_archive.len(), 1);
    }

    #[test]
    fn repeated_key_within_batch_is_archived_once() {
        let outcome = dedupe(
            vec![
                incident("a", Some("Pedestrian struck")),
                incident("a", Some("Pedestrian struck")),
            ],
            Vec::new(),
        );
        assert_eq!(keys(&outcome.to_process), vec!["a"]);
        assert_eq!(outcome.updated_archive.len(), 1);
    }

    #[test]
    fn dedupe_by_keeps_wrapper() {
        let batch = vec![
            ("vehicle", incident("a", Some("Vehicle collision"))),
            ("pedestrian", incident("b", Some("Pedestrian struck"))),
        ];
        let archived = vec![SeenIncidentRecord::from(&incident("a", Some("old")))];

        let outcome = dedupe_by(batch, archived, |(_, x)| x);
        assert_eq!(outcome.to_process.len(), 1);
        assert_eq!(outcome.to_process[0].0, "pedestrian");
        assert_eq!(outcome.updated_archive[1].key, "b");
    }

    #[test]
    fn blank_record_does_not_shadow_later_duplicate() {
        let outcome = dedupe(
            vec![incident("a", None), incident("a", Some("Cyclist struck"))],
            Vec::new(),
        );
        assert_eq!(keys(&outcome.to_process), vec!["a"]);
    }
}
