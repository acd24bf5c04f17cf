//! Persisted set of torrent hashes.
//!
//! One generic store backs both on-disk sets:
//! - `completed.json`: hashes already announced as completed (drives dedup)
//! - `do_not_notify.json`: hashes excluded from notification
//!
//! The file format is a JSON array of hash strings. A missing file loads as
//! an empty set; a file that exists but does not parse is an error, because
//! continuing with unknown dedup state would re-announce every torrent.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::atomic::atomic_write;
use crate::error::{PersistenceError, Result};

const COMPLETED_FILE: &str = "completed.json";
const DO_NOT_NOTIFY_FILE: &str = "do_not_notify.json";

/// A persisted, append-only set of opaque hash strings.
pub struct HashStore {
    path: PathBuf,
    entries: Mutex<HashSet<String>>,
}

impl HashStore {
    /// Opens the store backing the given file, loading any existing entries.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = read_entries(&path)?;
        debug!(path = %path.display(), count = entries.len(), "loaded hash store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Opens the completed-torrents set under `dir`.
    pub fn completed(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(dir.as_ref().join(COMPLETED_FILE))
    }

    /// Opens the notification-suppression set under `dir`.
    pub fn do_not_notify(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open(dir.as_ref().join(DO_NOT_NOTIFY_FILE))
    }

    /// Returns the number of stored hashes.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no hashes are stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns true if `hash` is in the set.
    pub fn contains(&self, hash: &str) -> bool {
        self.lock().contains(hash)
    }

    /// Checks whether `hash` is new and, if so, commits it to the set.
    ///
    /// Returns `true` exactly once per hash across the lifetime of the
    /// backing file, including across restarts. The insertion is persisted
    /// before this returns. This is the only insertion path the completed
    /// set should use.
    pub fn mark_new(&self, hash: &str) -> Result<bool> {
        let mut entries = self.lock();
        if entries.contains(hash) {
            return Ok(false);
        }
        entries.insert(hash.to_string());
        self.persist(&entries)?;
        Ok(true)
    }

    /// Inserts every hash in `hashes`, persisting once at the end.
    ///
    /// Returns the number of hashes that were actually new. Used at startup
    /// to backfill torrents that completed while the bot was not running.
    pub fn insert_all<I, S>(&self, hashes: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries = self.lock();
        let before = entries.len();
        for hash in hashes {
            entries.insert(hash.into());
        }
        let added = entries.len() - before;
        if added > 0 {
            self.persist(&entries)?;
        }
        Ok(added)
    }

    /// Re-reads the backing file, replacing the in-memory set.
    ///
    /// The suppression set may be edited by other processes; the
    /// notification pipeline refreshes it at the start of every poll so
    /// external changes take effect without a restart.
    pub fn refresh(&self) -> Result<()> {
        let fresh = read_entries(&self.path)?;
        *self.lock() = fresh;
        Ok(())
    }

    fn persist(&self, entries: &HashSet<String>) -> Result<()> {
        // Sorted output keeps the file diffable and stable across rewrites
        let mut list: Vec<&String> = entries.iter().collect();
        list.sort();
        let json = serde_json::to_vec(&list)?;
        atomic_write(&self.path, &json)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_entries(path: &Path) -> Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let data = fs::read_to_string(path).map_err(|source| PersistenceError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let list: Vec<String> =
        serde_json::from_str(&data).map_err(|source| PersistenceError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(list.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = HashStore::completed(dir.path()).unwrap();

        assert!(store.is_empty());
        assert!(!store.contains("abc"));
    }

    #[test]
    fn test_mark_new_twice() {
        let dir = tempdir().unwrap();
        let store = HashStore::completed(dir.path()).unwrap();

        assert!(store.mark_new("a1").unwrap());
        assert!(!store.mark_new("a1").unwrap());
    }

    #[test]
    fn test_mark_new_survives_reload() {
        let dir = tempdir().unwrap();
        {
            let store = HashStore::completed(dir.path()).unwrap();
            assert!(store.mark_new("a1").unwrap());
        }

        let reloaded = HashStore::completed(dir.path()).unwrap();
        assert!(!reloaded.mark_new("a1").unwrap());
        assert!(reloaded.contains("a1"));
    }

    #[test]
    fn test_insert_all_counts_new_only() {
        let dir = tempdir().unwrap();
        let store = HashStore::completed(dir.path()).unwrap();

        store.mark_new("a1").unwrap();
        let added = store.insert_all(["a1", "b2", "c3"]).unwrap();

        assert_eq!(added, 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(COMPLETED_FILE);
        fs::write(&path, "{not json").unwrap();

        let result = HashStore::completed(dir.path());
        assert!(matches!(result, Err(PersistenceError::Malformed { .. })));
    }

    #[test]
    fn test_refresh_picks_up_external_writes() {
        let dir = tempdir().unwrap();
        let store = HashStore::do_not_notify(dir.path()).unwrap();
        assert!(!store.contains("muted"));

        // Simulate another process editing the suppression file
        let path = dir.path().join(DO_NOT_NOTIFY_FILE);
        fs::write(&path, r#"["muted"]"#).unwrap();

        store.refresh().unwrap();
        assert!(store.contains("muted"));
    }

    #[test]
    fn test_file_format_is_a_plain_json_array() {
        let dir = tempdir().unwrap();
        let store = HashStore::completed(dir.path()).unwrap();
        store.mark_new("b2").unwrap();
        store.mark_new("a1").unwrap();

        let raw = fs::read_to_string(dir.path().join(COMPLETED_FILE)).unwrap();
        assert_eq!(raw, r#"["a1","b2"]"#);
    }
}
