//! On-disk archive file.

use std::path::{Path, PathBuf};

use traffic_watch_incident_models::SeenIncidentRecord;

use crate::ArchiveError;
use crate::atomic::write_atomic;

/// The per-location archive of processed incidents.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    path: PathBuf,
}

impl ArchiveStore {
    /// Creates a store backed by the JSON file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the archive file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the archive.
    ///
    /// Never fails: a missing, empty, unreadable, or unparseable file is
    /// logged and treated as an empty archive, so a damaged archive can at
    /// worst cause incidents to be posted twice. An unparseable file is
    /// first renamed to `<file>.corrupt-<timestamp>` so the next save does
    /// not destroy it.
    #[must_use]
    pub fn load(&self) -> Vec<SeenIncidentRecord> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No archive at {}; starting empty", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                log::warn!(
                    "Failed to read archive {}: {e}; treating as empty",
                    self.path.display()
                );
                return Vec::new();
            }
        };

        if contents.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<SeenIncidentRecord>>(&contents) {
            Ok(records) => {
                log::info!(
                    "Loaded {} archived incident(s) from {}",
                    records.len(),
                    self.path.display()
                );
                records
            }
            Err(e) => {
                log::warn!(
                    "Failed to parse archive {}: {e}; treating as empty",
                    self.path.display()
                );
                self.quarantine();
                Vec::new()
            }
        }
    }

    fn quarantine(&self) {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(
            ".corrupt-{}",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
        ));
        let dest = PathBuf::from(name);

        match std::fs::rename(&self.path, &dest) {
            Ok(()) => log::warn!("Moved corrupt archive to {}", dest.display()),
            Err(e) => log::warn!(
                "Failed to move corrupt archive {} aside: {e}",
                self.path.display()
            ),
        }
    }

    /// Replaces the archive file with `records`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if serialization or the atomic write fails.
    pub fn save(&self, records: &[SeenIncidentRecord]) -> Result<(), ArchiveError> {
        let json = serde_json::to_string(records)?;
        write_atomic(&self.path, &json)?;
        log::info!(
            "Saved {} archived incident(s) to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}
