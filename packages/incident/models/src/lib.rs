#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident feed record types and the verdicts assigned to them.
//!
//! [`Incident`] mirrors the subset of the trending-incidents feed payload
//! that the bot reads. [`SeenIncidentRecord`] is the minimal projection kept
//! in the per-location dedup archive, and [`TrackedIncident`] carries an
//! incident through the rest of a run once it has been classified.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Update `type` marking the initial report of an incident.
pub const ROOT_UPDATE_TYPE: &str = "ROOT";

/// A single incident as returned by the feed.
///
/// Only `key` and `ts` are required. Everything else is optional because
/// the feed omits fields freely, and a record without a description is
/// filtered out later rather than rejected at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// Stable unique identifier assigned by the feed.
    pub key: String,
    /// Full free-text description.
    #[serde(default)]
    pub raw: Option<String>,
    /// Short headline.
    #[serde(default)]
    pub title: Option<String>,
    /// Event timestamp in epoch milliseconds.
    pub ts: i64,
    /// Latitude (WGS84).
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude (WGS84).
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Display address (e.g. "W Broad St & N Lombardy St").
    #[serde(default)]
    pub address: Option<String>,
    /// URL of the feed's rendered map image for this incident.
    #[serde(default)]
    pub share_map: Option<String>,
    /// `[lat, lng]` pair as supplied by the feed.
    #[serde(default)]
    pub ll: Option<Vec<f64>>,
    /// Narrative updates in the order the feed supplied them.
    #[serde(default, deserialize_with = "deserialize_nullable_updates")]
    pub updates: IncidentUpdates,
}

impl Incident {
    /// Returns the `raw` description, or `""` when the feed omitted it.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        self.raw.as_deref().unwrap_or_default()
    }

    /// Whether the incident carries a usable description.
    #[must_use]
    pub fn has_description(&self) -> bool {
        self.raw.as_deref().is_some_and(|raw| !raw.trim().is_empty())
    }

    /// The top-level text fields (`raw`, then `title`) that are present.
    pub fn top_level_texts(&self) -> impl Iterator<Item = &str> {
        [self.raw.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
    }

    /// Updates that belong in the narrative thread (everything but the
    /// `ROOT` report).
    pub fn narrative_updates(&self) -> impl Iterator<Item = &IncidentUpdate> {
        self.updates
            .iter()
            .map(|(_, update)| update)
            .filter(|update| !update.is_root())
    }

    /// Returns `(latitude, longitude)`, falling back to the `ll` pair.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        if let (Some(lat), Some(lng)) = (self.latitude, self.longitude) {
            return Some((lat, lng));
        }
        match self.ll.as_deref() {
            Some([lat, lng, ..]) => Some((*lat, *lng)),
            _ => None,
        }
    }
}

/// A timestamped amendment to an incident's narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentUpdate {
    /// Update text.
    #[serde(default)]
    pub text: String,
    /// Epoch milliseconds.
    #[serde(default)]
    pub ts: i64,
    /// Update type; [`ROOT_UPDATE_TYPE`] marks the initial report.
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl IncidentUpdate {
    /// Whether this is the initial report rather than a follow-up.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.kind == ROOT_UPDATE_TYPE
    }
}

/// Update-id → update mapping that keeps the feed's insertion order.
///
/// The feed sends updates as a JSON object whose key order is the
/// chronological order, so this deserializes into a `Vec` rather than a
/// sorted map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentUpdates(pub Vec<(String, IncidentUpdate)>);

impl IncidentUpdates {
    /// Iterates `(update_id, update)` pairs in feed order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, IncidentUpdate)> {
        self.0.iter()
    }

    /// Number of updates, `ROOT` included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no updates at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, IncidentUpdate)> for IncidentUpdates {
    fn from_iter<T: IntoIterator<Item = (String, IncidentUpdate)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for IncidentUpdates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, update) in &self.0 {
            map.serialize_entry(id, update)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for IncidentUpdates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedUpdates;

        impl<'de> Visitor<'de> for OrderedUpdates {
            type Value = IncidentUpdates;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of update ids to updates")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut updates = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, update)) = access.next_entry::<String, IncidentUpdate>()? {
                    updates.push((id, update));
                }
                Ok(IncidentUpdates(updates))
            }
        }

        deserializer.deserialize_map(OrderedUpdates)
    }
}

fn deserialize_nullable_updates<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<IncidentUpdates, D::Error> {
    Ok(Option::<IncidentUpdates>::deserialize(deserializer)?.unwrap_or_default())
}

/// Relevance verdict for a single incident.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// A pedestrian, cyclist, or scooter rider was involved.
    PedestrianOrCyclist,
    /// A vehicle collision with no pedestrian or cyclist mentioned.
    VehicleOnly,
    /// Not a traffic-violence incident.
    Irrelevant,
}

impl Verdict {
    /// Whether incidents with this verdict get posted.
    #[must_use]
    pub const fn is_relevant(self) -> bool {
        !matches!(self, Self::Irrelevant)
    }
}

/// Minimal projection of a processed incident kept in the dedup archive.
///
/// Field names match the archive files written by earlier versions of the
/// bot (`ll`, `shareMap`); unknown fields such as the old `date` string are
/// ignored on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeenIncidentRecord {
    /// Feed identifier of the incident.
    pub key: String,
    /// Description at the time it was processed.
    #[serde(default)]
    pub raw: Option<String>,
    /// Event timestamp in epoch milliseconds.
    #[serde(default)]
    pub ts: i64,
    /// `[lat, lng]` pair.
    #[serde(default, rename = "ll")]
    pub coordinates: Option<Vec<f64>>,
    /// Map image URL.
    #[serde(default, rename = "shareMap")]
    pub map_image_url: Option<String>,
}

impl From<&Incident> for SeenIncidentRecord {
    fn from(incident: &Incident) -> Self {
        Self {
            key: incident.key.clone(),
            raw: incident.raw.clone(),
            ts: incident.ts,
            coordinates: incident
                .ll
                .clone()
                .or_else(|| incident.coordinates().map(|(lat, lng)| vec![lat, lng])),
            map_image_url: incident.share_map.clone(),
        }
    }
}

/// An incident that survived classification and deduplication, with the
/// district it was mapped to (when district mapping is enabled and a
/// boundary contains it).
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedIncident {
    /// The feed record.
    pub incident: Incident,
    /// Why it is being posted.
    pub verdict: Verdict,
    /// Resolved district name.
    pub district: Option<String>,
}

impl TrackedIncident {
    /// Wraps a classified incident with no district resolved yet.
    #[must_use]
    pub const fn new(incident: Incident, verdict: Verdict) -> Self {
        Self {
            incident,
            verdict,
            district: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_RECORD: &str = r#"{
        "key": "abc123",
        "raw": "Pedestrian Struck by Vehicle",
        "title": "Pedestrian Struck",
        "ts": 1671140938298,
        "latitude": 37.54,
        "longitude": -77.43,
        "address": "W Broad St & N Lombardy St",
        "shareMap": "https://example.com/map.png",
        "cityCode": "rva",
        "updates": {
            "zzz": {"text": "Pedestrian Struck by Vehicle", "ts": 1, "type": "ROOT"},
            "aaa": {"text": "Victim transported", "ts": 2, "type": "UPDATE"},
            "mmm": {"text": "Road reopened", "ts": 3, "type": "UPDATE"}
        }
    }"#;

    #[test]
    fn keeps_update_insertion_order() {
        let incident: Incident = serde_json::from_str(FEED_RECORD).unwrap();
        let ids: Vec<&str> = incident.updates.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["zzz", "aaa", "mmm"]);
    }

    #[test]
    fn narrative_updates_skip_root() {
        let incident: Incident = serde_json::from_str(FEED_RECORD).unwrap();
        let texts: Vec<&str> = incident
            .narrative_updates()
            .map(|u| u.text.as_str())
            .collect();
        assert_eq!(texts, vec!["Victim transported", "Road reopened"]);
    }

    #[test]
    fn tolerates_missing_and_null_fields() {
        let incident: Incident =
            serde_json::from_str(r#"{"key": "k", "ts": 5, "updates": null}"#).unwrap();
        assert!(incident.updates.is_empty());
        assert!(!incident.has_description());
        assert_eq!(incident.raw_text(), "");
        assert_eq!(incident.top_level_texts().count(), 0);
    }

    #[test]
    fn whitespace_raw_is_not_a_description() {
        let incident: Incident =
            serde_json::from_str(r#"{"key": "k", "ts": 5, "raw": "   "}"#).unwrap();
        assert!(!incident.has_description());
    }

    #[test]
    fn coordinates_fall_back_to_ll() {
        let incident: Incident =
            serde_json::from_str(r#"{"key": "k", "ts": 5, "ll": [37.5, -77.4]}"#).unwrap();
        assert_eq!(incident.coordinates(), Some((37.5, -77.4)));
    }

    #[test]
    fn seen_record_uses_archive_field_names() {
        let incident: Incident = serde_json::from_str(FEED_RECORD).unwrap();
        let record = SeenIncidentRecord::from(&incident);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["key"], "abc123");
        assert_eq!(json["shareMap"], "https://example.com/map.png");
        assert_eq!(json["ll"], serde_json::json!([37.54, -77.43]));
    }

    #[test]
    fn seen_record_ignores_legacy_date_field() {
        let record: SeenIncidentRecord = serde_json::from_str(
            r#"{"key": "k", "raw": "r", "ts": 1, "date": "12/15/2022, 4:48:58 PM", "ll": [1.0, 2.0], "shareMap": "u"}"#,
        )
        .unwrap();
        assert_eq!(record.key, "k");
        assert_eq!(record.map_image_url.as_deref(), Some("u"));
    }

    #[test]
    fn verdict_relevance() {
        assert!(Verdict::PedestrianOrCyclist.is_relevant());
        assert!(Verdict::VehicleOnly.is_relevant());
        assert!(!Verdict::Irrelevant.is_relevant());
        assert_eq!(Verdict::VehicleOnly.to_string(), "VEHICLE_ONLY");
    }
}
