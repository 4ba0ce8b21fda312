//! JSON file-per-key store.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

use crate::error::StorageError;

/// Key-value store persisting each key as `<key>.json` under its root.
///
/// Reads degrade to `None` on missing or corrupt files; the owning
/// component falls back to its empty/default state, matching the
/// fail-open posture of the rest of the core.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open the store at the default data directory.
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self {
            root: super::data_dir()?,
        })
    }

    /// Open a store rooted at a specific directory (used by tests).
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory this store persists into.
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys like "repScope:ann@x.edu" must map to portable file names.
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.root.join(format!("{file}.json"))
    }

    /// Read and decode a value, or `None` when absent or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        let content = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding unreadable stored value");
                None
            }
        }
    }

    /// Encode and persist a value under `key`.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let data = serde_json::to_string_pretty(value).map_err(|source| {
            StorageError::EncodeFailed {
                key: key.to_string(),
                source,
            }
        })?;
        std::fs::write(self.path_for(key), data).map_err(|source| StorageError::WriteFailed {
            key: key.to_string(),
            source,
        })
    }

    /// Remove a key. Missing keys are not an error.
    pub fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }
}
