#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! District attribution for incidents.
//!
//! Downloads a location's district boundary `FeatureCollection`, loads the
//! polygons into an R-tree, and resolves incident coordinates to a
//! district name.

use std::path::{Path, PathBuf};

use geo::{BoundingRect as _, Intersects as _, MultiPolygon};
use geojson::{GeoJson, JsonValue};
use rstar::{AABB, RTree, RTreeObject};
use traffic_watch_incident_models::TrackedIncident;
use traffic_watch_source::SourceError;

/// File name of the downloaded boundaries inside the asset directory.
pub const BOUNDARIES_FILE_NAME: &str = "districts.geojson";

/// Errors from loading district boundaries.
#[derive(Debug, thiserror::Error)]
pub enum DistrictError {
    /// Downloading the boundary file failed.
    #[error("Failed to download district boundaries: {0}")]
    Download(#[from] SourceError),

    /// Reading the boundary file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The file is not valid `GeoJSON`.
    #[error("Invalid district GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document is valid `GeoJSON` but not a `FeatureCollection`.
    #[error("District boundaries must be a FeatureCollection")]
    NotFeatureCollection,
}

struct DistrictEntry {
    /// Position in the source collection; lower wins on overlap.
    order: usize,
    name: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for DistrictEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// District polygons indexed for point lookups.
pub struct DistrictIndex {
    tree: RTree<DistrictEntry>,
}

impl DistrictIndex {
    /// Builds an index from a `FeatureCollection`, naming each district by
    /// its `name_property`. Features without a polygon geometry or without
    /// the property are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`DistrictError`] if `geojson` does not parse or is not a
    /// `FeatureCollection`.
    pub fn from_geojson(geojson: &str, name_property: &str) -> Result<Self, DistrictError> {
        let GeoJson::FeatureCollection(collection) = geojson.parse::<GeoJson>()? else {
            return Err(DistrictError::NotFeatureCollection);
        };

        let mut entries = Vec::with_capacity(collection.features.len());
        for (order, feature) in collection.features.into_iter().enumerate() {
            let Some(name) = feature.property(name_property).and_then(property_text) else {
                log::warn!("District feature #{order} has no '{name_property}' property");
                continue;
            };
            let Some(polygon) = feature.geometry.and_then(to_multipolygon) else {
                log::warn!("District '{name}' has no polygon geometry");
                continue;
            };

            entries.push(DistrictEntry {
                order,
                name,
                envelope: compute_envelope(&polygon),
                polygon,
            });
        }

        log::info!("Loaded {} district polygon(s)", entries.len());
        Ok(Self {
            tree: RTree::bulk_load(entries),
        })
    }

    /// Reads and indexes a boundary file.
    ///
    /// # Errors
    ///
    /// Returns [`DistrictError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path, name_property: &str) -> Result<Self, DistrictError> {
        let contents = std::fs::read_to_string(path).map_err(|source| DistrictError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_geojson(&contents, name_property)
    }

    /// Number of indexed districts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether no district was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the first district, in file order, containing the point.
    /// Points on a boundary belong to every district sharing it.
    #[must_use]
    pub fn lookup(&self, latitude: f64, longitude: f64) -> Option<&str> {
        let point = geo::Point::new(longitude, latitude);
        let query_env = AABB::from_point([longitude, latitude]);

        self.tree
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.intersects(&point))
            .min_by_key(|entry| entry.order)
            .map(|entry| entry.name.as_str())
    }

    /// Fills in `district` for every incident with coordinates. Returns the
    /// number of incidents that landed in a district.
    pub fn assign(&self, incidents: &mut [TrackedIncident]) -> usize {
        let mut resolved = 0;
        for tracked in incidents.iter_mut() {
            tracked.district = tracked
                .incident
                .coordinates()
                .and_then(|(lat, lng)| self.lookup(lat, lng))
                .map(str::to_string);
            if tracked.district.is_some() {
                resolved += 1;
            } else {
                log::debug!("Incident {} is outside every district", tracked.incident.key);
            }
        }
        log::info!(
            "Resolved districts for {resolved} of {} incident(s)",
            incidents.len()
        );
        resolved
    }
}

/// Downloads the boundary file for a location into `asset_dir`.
///
/// # Errors
///
/// Returns [`DistrictError::Download`] if the download fails.
pub async fn download_boundaries(
    client: &reqwest::Client,
    url: &str,
    asset_dir: &Path,
) -> Result<PathBuf, DistrictError> {
    let dest = asset_dir.join(BOUNDARIES_FILE_NAME);
    log::info!("Downloading district boundaries from {url}");
    traffic_watch_source::download::download_file(client, url, &dest).await?;
    Ok(dest)
}

fn property_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    match geo::Geometry::<f64>::try_from(geometry).ok()? {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

fn compute_envelope(mp: &MultiPolygon<f64>) -> AABB<[f64; 2]> {
    mp.bounding_rect().map_or_else(
        || AABB::from_point([0.0, 0.0]),
        |rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use traffic_watch_incident_models::{Incident, IncidentUpdates, Verdict};

    // Two unit squares side by side, plus an overlapping square listed
    // last, a point feature, and a feature without a name.
    const DISTRICTS: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"NAME": "1st District"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
            {"type": "Feature", "properties": {"NAME": 2},
             "geometry": {"type": "MultiPolygon", "coordinates": [[[[1,0],[2,0],[2,1],[1,1],[1,0]]]]}},
            {"type": "Feature", "properties": {"NAME": "Overlap"},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,1],[0,1],[0,0]]]}},
            {"type": "Feature", "properties": {"NAME": "Point"},
             "geometry": {"type": "Point", "coordinates": [5,5]}},
            {"type": "Feature", "properties": {"OTHER": "x"},
             "geometry": {"type": "Polygon", "coordinates": [[[3,3],[4,3],[4,4],[3,4],[3,3]]]}}
        ]
    }"#;

    fn index() -> DistrictIndex {
        DistrictIndex::from_geojson(DISTRICTS, "NAME").unwrap()
    }

    #[test]
    fn skips_unusable_features() {
        assert_eq!(index().len(), 3);
    }

    #[test]
    fn first_containing_feature_wins() {
        let index = index();
        assert_eq!(index.lookup(0.5, 0.5), Some("1st District"));
        assert_eq!(index.lookup(0.5, 1.5), Some("2"));
    }

    #[test]
    fn boundary_points_resolve_in_file_order() {
        let index = index();
        // Edge shared by the first two squares.
        assert_eq!(index.lookup(0.5, 1.0), Some("1st District"));
        // Outer edge and corner of the second square only.
        assert_eq!(index.lookup(0.5, 2.0), Some("2"));
        assert_eq!(index.lookup(1.0, 2.0), Some("2"));
        // Edge of the unnamed square, which is not indexed.
        assert_eq!(index.lookup(3.0, 3.5), None);
    }

    #[test]
    fn outside_every_district() {
        let index = index();
        assert_eq!(index.lookup(3.5, 3.5), None);
        assert_eq!(index.lookup(-10.0, -10.0), None);
    }

    #[test]
    fn custom_name_property() {
        let index = DistrictIndex::from_geojson(DISTRICTS, "OTHER").unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.lookup(3.5, 3.5), Some("x"));
    }

    #[test]
    fn rejects_non_collections() {
        let err = DistrictIndex::from_geojson(
            r#"{"type": "Point", "coordinates": [0, 0]}"#,
            "NAME",
        )
        .err()
        .unwrap();
        assert!(matches!(err, DistrictError::NotFeatureCollection));

        assert!(matches!(
            DistrictIndex::from_geojson("nope", "NAME"),
            Err(DistrictError::GeoJson(_))
        ));
    }

    #[test]
    fn assigns_incident_districts() {
        let incident = |key: &str, ll: Option<Vec<f64>>| {
            TrackedIncident::new(
                Incident {
                    key: key.to_string(),
                    raw: Some("Pedestrian struck".to_string()),
                    title: None,
                    ts: 0,
                    latitude: None,
                    longitude: None,
                    address: None,
                    share_map: None,
                    ll,
                    updates: IncidentUpdates::default(),
                },
                Verdict::PedestrianOrCyclist,
            )
        };
        let mut incidents = vec![
            incident("a", Some(vec![0.5, 1.5])),
            incident("b", None),
            incident("c", Some(vec![9.0, 9.0])),
        ];

        assert_eq!(index().assign(&mut incidents), 1);
        assert_eq!(incidents[0].district.as_deref(), Some("2"));
        assert_eq!(incidents[1].district, None);
        assert_eq!(incidents[2].district, None);
    }
}
