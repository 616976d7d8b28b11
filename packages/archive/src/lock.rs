//! Exclusive per-location run lock.
//!
//! The lock is a file created with `create_new`, so only one process can
//! hold it. It is removed when the [`RunLock`] is dropped. A lock file
//! older than the staleness threshold is assumed to belong to a run that
//! was killed and is reclaimed.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::ArchiveError;
use crate::atomic::io_err;

/// Default age after which a lock file is considered abandoned.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(6 * 60 * 60);

/// Held for the duration of a run.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// Takes the lock at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Locked`] if a fresh lock file already
    /// exists, or [`ArchiveError::Io`] if the file cannot be created.
    pub fn acquire(path: &Path, stale_after: Duration) -> Result<Self, ArchiveError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        match Self::create(path) {
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let holder = std::fs::read_to_string(path)
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !is_stale(path, stale_after) {
                    return Err(ArchiveError::Locked {
                        path: path.display().to_string(),
                        holder,
                    });
                }

                log::warn!(
                    "Reclaiming stale lock {} ({holder})",
                    path.display()
                );
                std::fs::remove_file(path).map_err(io_err(path))?;
                Self::create(path).map_err(io_err(path))
            }
            other => other.map_err(io_err(path)),
        }
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create(path: &Path) -> std::io::Result<Self> {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        writeln!(
            file,
            "pid={} started={}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        )?;
        log::debug!("Acquired run lock {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("Failed to release run lock {}: {e}", self.path.display());
        } else {
            log::debug!("Released run lock {}", self.path.display());
        }
    }
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age >= stale_after)
}
