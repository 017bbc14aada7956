//! Key-value persistence for small JSON blobs
//!
//! Mirrors the string-in/string-out storage API available on mobile
//! platforms: whole values are read and written, never patched. Two
//! backends are provided:
//! - [`FileStore`]: one file per key inside a data directory
//! - [`MemoryStore`]: process-local map, used by tests and dry runs
//!
//! # Example
//!
//! ```rust,ignore
//! use ausflug_core::kv::{KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set_item("location_settings", "{}").await?;
//! assert_eq!(store.get_item("location_settings").await?.as_deref(), Some("{}"));
//! ```

use crate::error::{Error, ErrorCode, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Async string store keyed by short identifiers
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`, returning whether it existed
    async fn remove_item(&self, key: &str) -> Result<bool>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to seed a value
    #[must_use]
    pub fn with_item(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut guard) = self.items.write() {
            guard.insert(key.into(), value.into());
        }
        self
    }

    /// Number of stored keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().map(|g| g.len()).unwrap_or(0)
    }

    /// Whether the store holds no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error() -> Error {
    Error::new(ErrorCode::Internal, "Memory store lock poisoned")
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let guard = self.items.read().map_err(|_| lock_error())?;
        Ok(guard.get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.items.write().map_err(|_| lock_error())?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<bool> {
        let mut guard = self.items.write().map_err(|_| lock_error())?;
        Ok(guard.remove(key).is_some())
    }
}

/// File-backed store: `<dir>/<key>.json`
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never observes a half-written value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::from(e).with_context(format!("Creating {}", dir.display())))?;
        Ok(Self { dir })
    }

    /// Root directory of the store
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(Error::invalid_key(key));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage_read(key).with_source(e)),
        }
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.item_path(key)?;
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));

        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| Error::storage_write(key).with_source(e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::storage_write(key).with_source(e));
        }

        debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<bool> {
        let path = self.item_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage_write(key).with_source(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("data")).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_file_set_and_get() {
        let (store, _temp) = test_store();

        store.set_item("location_settings", r#"{"locationEnabled":true}"#).await.unwrap();
        let value = store.get_item("location_settings").await.unwrap();

        assert_eq!(value.as_deref(), Some(r#"{"locationEnabled":true}"#));
    }

    #[tokio::test]
    async fn test_file_get_missing() {
        let (store, _temp) = test_store();
        assert!(store.get_item("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_overwrite_leaves_no_temp_files() {
        let (store, _temp) = test_store();

        store.set_item("notified_proximity_trips", "{}").await.unwrap();
        store.set_item("notified_proximity_trips", r#"{"7":1}"#).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(store.dir()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            store.get_item("notified_proximity_trips").await.unwrap().as_deref(),
            Some(r#"{"7":1}"#)
        );
    }

    #[tokio::test]
    async fn test_file_remove() {
        let (store, _temp) = test_store();

        store.set_item("to_remove", "42").await.unwrap();
        assert!(store.remove_item("to_remove").await.unwrap());
        assert!(!store.remove_item("to_remove").await.unwrap());
        assert!(store.get_item("to_remove").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_rejects_path_traversal() {
        let (store, _temp) = test_store();

        let err = store.set_item("../escape", "x").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StorageError);
        assert!(store.get_item("").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new().with_item("seed", "1");
        assert_eq!(store.len(), 1);

        store.set_item("other", "2").await.unwrap();
        assert_eq!(store.get_item("seed").await.unwrap().as_deref(), Some("1"));
        assert!(store.remove_item("seed").await.unwrap());
        assert_eq!(store.len(), 1);
    }
}
