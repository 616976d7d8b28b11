//! Text of the posts that make up an incident thread.

use chrono::{DateTime, FixedOffset};
use traffic_watch_incident_models::{Incident, TrackedIncident};
use traffic_watch_location::DistrictSettings;
use traffic_watch_poster::{MediaAttachment, Post};

/// Renders an epoch-millisecond timestamp in `offset`'s local time, as
/// `M/D/YYYY, h:mm:ss AM`.
#[must_use]
pub fn format_local_time(ts_ms: i64, offset: FixedOffset) -> String {
    DateTime::from_timestamp_millis(ts_ms).map_or_else(
        || ts_ms.to_string(),
        |utc| {
            utc.with_timezone(&offset)
                .format("%-m/%-d/%Y, %-I:%M:%S %p")
                .to_string()
        },
    )
}

fn location_phrase(incident: &Incident) -> String {
    let address = incident.address.as_deref().unwrap_or("an unknown address");
    match incident.coordinates() {
        Some((lat, lng)) => format!("{address}. Coordinates: {lat}, {lng}"),
        None => address.to_string(),
    }
}

/// Alt text for the feed's map image.
#[must_use]
pub fn map_alt_text(incident: &Incident) -> String {
    format!("A photo of a map at {}", location_phrase(incident))
}

/// Alt text for the satellite image.
#[must_use]
pub fn satellite_alt_text(incident: &Incident) -> String {
    format!("A satellite photo of a map at {}", location_phrase(incident))
}

/// Builds the thread for one incident: the report with its images, each
/// narrative update, and optionally who represents the district.
///
/// `districts` is `Some` only when representatives are enabled.
#[must_use]
pub fn incident_thread(
    tracked: &TrackedIncident,
    media: Vec<MediaAttachment>,
    offset: FixedOffset,
    districts: Option<&DistrictSettings>,
) -> Vec<Post> {
    let incident = &tracked.incident;
    let mut posts = vec![Post {
        text: format!(
            "{}\n\n{}",
            incident.raw_text(),
            format_local_time(incident.ts, offset)
        ),
        media,
    }];

    posts.extend(incident.narrative_updates().map(|update| {
        Post::text(format!(
            "{}\n\n{}",
            update.text,
            format_local_time(update.ts, offset)
        ))
    }));

    if let Some(settings) = districts
        && let Some(district) = tracked.district.as_deref()
        && let Some(rep) = settings.member_for(district)
    {
        posts.push(Post::text(format!(
            "This incident occurred in {} {district}. \n\nRepresentative: {rep}",
            settings.district_term
        )));
    }

    posts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use traffic_watch_incident_models::Verdict;

    fn eastern() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn tracked(district: Option<&str>) -> TrackedIncident {
        let incident: Incident = serde_json::from_str(
            r#"{
                "key": "k1",
                "raw": "Pedestrian struck",
                "ts": 1671140938298,
                "address": "123 Main St",
                "latitude": 37.5,
                "longitude": -77.4,
                "updates": {
                    "r": {"text": "Pedestrian struck", "ts": 1671140938298, "type": "ROOT"},
                    "u1": {"text": "Victim transported", "ts": 1671141538298, "type": "UPDATE"}
                }
            }"#,
        )
        .unwrap();
        let mut x = TrackedIncident::new(incident, Verdict::PedestrianOrCyclist);
        x.district = district.map(str::to_string);
        x
    }

    fn settings() -> DistrictSettings {
        DistrictSettings {
            district_term: "district".to_string(),
            geojson_url: "https://example.com/d.geojson".to_string(),
            district_property: "NAME".to_string(),
            members: BTreeMap::from([("2nd District".to_string(), "@rep2".to_string())]),
            at_large: Vec::new(),
        }
    }

    #[test]
    fn formats_local_time() {
        // 2022-12-15T21:48:58Z
        assert_eq!(
            format_local_time(1_671_140_938_298, eastern()),
            "12/15/2022, 4:48:58 PM"
        );
        assert_eq!(
            format_local_time(0, FixedOffset::east_opt(0).unwrap()),
            "1/1/1970, 12:00:00 AM"
        );
    }

    #[test]
    fn alt_text_includes_coordinates() {
        let x = tracked(None);
        assert_eq!(
            map_alt_text(&x.incident),
            "A photo of a map at 123 Main St. Coordinates: 37.5, -77.4"
        );
        assert!(satellite_alt_text(&x.incident).starts_with("A satellite photo of a map at 123"));
    }

    #[test]
    fn thread_skips_root_update() {
        let posts = incident_thread(&tracked(None), Vec::new(), eastern(), None);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].text, "Pedestrian struck\n\n12/15/2022, 4:48:58 PM");
        assert_eq!(posts[1].text, "Victim transported\n\n12/15/2022, 4:58:58 PM");
    }

    #[test]
    fn representative_post_when_known() {
        let settings = settings();
        let posts = incident_thread(
            &tracked(Some("2nd District")),
            Vec::new(),
            eastern(),
            Some(&settings),
        );
        assert_eq!(
            posts.last().unwrap().text,
            "This incident occurred in district 2nd District. \n\nRepresentative: @rep2"
        );

        let posts = incident_thread(
            &tracked(Some("9th District")),
            Vec::new(),
            eastern(),
            Some(&settings),
        );
        assert_eq!(posts.len(), 2);
    }
}
