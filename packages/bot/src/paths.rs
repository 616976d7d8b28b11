//! Where a location's state lives under the data directory.

use std::path::{Path, PathBuf};

/// Per-location file layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// `archive/seen-incidents-<location>.json`
    pub archive_file: PathBuf,
    /// `archive/summary-<location>.json`
    pub summary_file: PathBuf,
    /// `archive/run-<location>.lock`
    pub lock_file: PathBuf,
    /// `assets-<location>/`, wiped at the start of every run.
    pub asset_dir: PathBuf,
}

impl DataPaths {
    /// Lays out the files of `location` under `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path, location: &str) -> Self {
        let archive = data_dir.join("archive");
        Self {
            archive_file: archive.join(format!("seen-incidents-{location}.json")),
            summary_file: archive.join(format!("summary-{location}.json")),
            lock_file: archive.join(format!("run-{location}.lock")),
            asset_dir: data_dir.join(format!("assets-{location}")),
        }
    }

    /// Map image path for an incident.
    #[must_use]
    pub fn map_image(&self, key: &str) -> PathBuf {
        self.asset_dir.join(format!("{key}.png"))
    }

    /// Satellite image path for an incident.
    #[must_use]
    pub fn satellite_image(&self, key: &str) -> PathBuf {
        self.asset_dir.join(format!("{key}_satellite.png"))
    }
}
