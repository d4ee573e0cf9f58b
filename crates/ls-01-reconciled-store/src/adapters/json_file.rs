//! # JSON File Store
//!
//! A [`KeyValueStore`] persisted as one JSON object on disk. Every write
//! rewrites the file through a temporary sibling and a rename, so a crash
//! leaves either the old or the new file.

use crate::domain::StoreError;
use crate::ports::KeyValueStore;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed key-value store.
#[derive(Debug)]
pub struct JsonFileKeyValueStore {
    path: PathBuf,
    data: BTreeMap<String, String>,
}

impl JsonFileKeyValueStore {
    /// Open `path`, creating an empty store if the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Corruption {
                message: format!("{}: {e}", path.display()),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "[ls-01] Snapshot file absent, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, data })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        let raw = serde_json::to_string_pretty(&self.data)?;
        fs::write(&tmp, raw)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            warn!(path = %self.path.display(), error = %e, "[ls-01] Snapshot rename failed");
            return Err(e.into());
        }
        Ok(())
    }
}

impl KeyValueStore for JsonFileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.data.insert(key.to_string(), value);
        self.flush()
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        if self.data.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .data
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshots.json");

        let mut store = JsonFileKeyValueStore::open(&path).unwrap();
        store.put("balance:a", "{\"x\":1}".to_string()).unwrap();
        store.put("cycles:c", "2".to_string()).unwrap();
        store.delete("cycles:c").unwrap();
        drop(store);

        let reopened = JsonFileKeyValueStore::open(&path).unwrap();
        assert_eq!(reopened.get("balance:a").unwrap(), Some("{\"x\":1}".to_string()));
        assert_eq!(reopened.get("cycles:c").unwrap(), None);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileKeyValueStore::open(dir.path().join("nested/none.json")).unwrap();
        assert!(store.prefix_scan("").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileKeyValueStore::open(&path),
            Err(StoreError::Corruption { .. })
        ));
    }
}
