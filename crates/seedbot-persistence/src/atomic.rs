//! Atomic file operations for crash-safe persistence.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{PersistenceError, Result};

/// Writes data to a file atomically.
///
/// The data goes to a temporary file in the same directory first, then a
/// rename moves it over the target. A crash mid-write can never leave a
/// torn file that fails to parse on the next load.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| PersistenceError::DirectoryError {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    // Temp file in the same directory so the rename stays on one filesystem
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut temp_file =
        tempfile::NamedTempFile::new_in(dir).map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .write_all(data)
        .and_then(|()| temp_file.flush())
        .map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .persist(path)
        .map_err(|e| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        atomic_write(&path, b"[\"abc\"]").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[\"abc\"]");
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/state/hashes.json");

        atomic_write(&path, b"[]").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_atomic_write_replaces_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        atomic_write(&path, b"old").unwrap();
        atomic_write(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }
}
