//! Atomic file replacement.

use std::path::Path;

use crate::ArchiveError;

/// Writes `contents` to `path` by writing a sibling `.tmp` file and renaming
/// it over the target, so an interrupted run never leaves a truncated file.
///
/// Creates the parent directory if needed.
///
/// # Errors
///
/// Returns [`ArchiveError::Io`] if the directory, temp file, or rename
/// fails.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), ArchiveError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, contents).map_err(io_err(&tmp_path))?;
    std::fs::rename(&tmp_path, path).map_err(io_err(path))?;

    Ok(())
}

/// Builds a `map_err` adapter that tags an I/O error with `path`.
pub(crate) fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ArchiveError + use<> {
    let path = path.display().to_string();
    move |source: std::io::Error| ArchiveError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_and_replaces() {
        let dir = std::env::temp_dir().join(format!("tw_atomic_test_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("state.json");

        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.join("nested").join("state.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
