//! On-disk summary counters.

use std::path::{Path, PathBuf};

use traffic_watch_archive::atomic::write_atomic;
use traffic_watch_summary_models::SummaryState;

use crate::SummaryError;

/// The per-location summary counters file.
///
/// Unlike the dedup archive this file is not read fail-open: lost counters
/// cannot be rebuilt, so a corrupt file stops the run.
#[derive(Debug, Clone)]
pub struct SummaryStore {
    path: PathBuf,
}

impl SummaryStore {
    /// Creates a store backed by the JSON file at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the counters file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the counters. A missing or empty file yields zeroed counters.
    ///
    /// # Errors
    ///
    /// * [`SummaryError::Read`] if the file exists but cannot be read
    /// * [`SummaryError::Corrupt`] if it does not parse
    pub fn load(&self) -> Result<SummaryState, SummaryError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    "No summary counters at {}; starting from zero",
                    self.path.display()
                );
                return Ok(SummaryState::default());
            }
            Err(source) => {
                return Err(SummaryError::Read {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(SummaryState::default());
        }

        serde_json::from_str(&contents).map_err(|source| SummaryError::Corrupt {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Atomically replaces the counters file.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError`] if serialization or the write fails.
    pub fn save(&self, state: &SummaryState) -> Result<(), SummaryError> {
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, &json)?;
        log::debug!(
            "Saved summary counters (week {}, month {}) to {}",
            state.week.total,
            state.month.total,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "tw_summary_store_{name}_{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn missing_file_is_zero() {
        let dir = scratch("missing");
        let state = SummaryStore::new(dir.join("summary.json")).load().unwrap();
        assert_eq!(state, SummaryState::default());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = scratch("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("summary.json");
        std::fs::write(&path, "{\"week\": ").unwrap();

        let err = SummaryStore::new(path).load().unwrap_err();
        assert!(matches!(err, SummaryError::Corrupt { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_then_load() {
        let dir = scratch("roundtrip");
        let store = SummaryStore::new(dir.join("archive").join("summary.json"));
        let mut state = SummaryState::default();
        state.week.add_total(2);
        state.month.add_total(9);
        state.month.bump_district("4th");

        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
