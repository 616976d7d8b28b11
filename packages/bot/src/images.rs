//! Map images attached to the first post of an incident thread.

use traffic_watch_incident_models::Incident;
use traffic_watch_poster::MediaAttachment;
use traffic_watch_source::download::{download_file, satellite_image_url};

use crate::paths::DataPaths;
use crate::thread::{map_alt_text, satellite_alt_text};

/// Downloads the feed's map image and, when `google_key` is set, a
/// satellite image. A failed download is logged and that image left out.
pub async fn fetch_images(
    http: &reqwest::Client,
    incident: &Incident,
    paths: &DataPaths,
    google_key: Option<&str>,
) -> Vec<MediaAttachment> {
    let mut media = Vec::with_capacity(2);

    if let Some(url) = incident.share_map.as_deref() {
        let dest = paths.map_image(&incident.key);
        match download_file(http, url, &dest).await {
            Ok(_) => media.push(MediaAttachment {
                path: dest,
                alt_text: map_alt_text(incident),
            }),
            Err(e) => log::warn!("Failed to download map image for {}: {e}", incident.key),
        }
    }

    if let Some(key) = google_key {
        if let Some((lat, lng)) = incident.coordinates() {
            let dest = paths.satellite_image(&incident.key);
            match download_file(http, &satellite_image_url(lat, lng, key), &dest).await {
                Ok(_) => media.push(MediaAttachment {
                    path: dest,
                    alt_text: satellite_alt_text(incident),
                }),
                Err(e) => log::warn!(
                    "Failed to download satellite image for {}: {e}",
                    incident.key
                ),
            }
        } else {
            log::debug!("No coordinates for {}; skipping satellite image", incident.key);
        }
    }

    media
}
