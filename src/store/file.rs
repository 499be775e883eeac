//! File-backed persistent store.
//!
//! Stores each key as an individual JSON file under a base directory.
//! Values survive process restarts; nothing coordinates concurrent
//! writers, so the last writer wins.
//!
//! # Security
//!
//! Keys are validated to prevent directory escape: only alphanumeric
//! characters, dashes, and underscores are allowed.

use crate::store::KeyValueStore;
use crate::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-backed persistent store.
pub struct FileStore {
    /// Base directory for storage.
    base_path: PathBuf,
}

impl FileStore {
    /// Creates a new file store rooted at `base_path`.
    ///
    /// The directory is created lazily on the first write.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Creates a new file store with checked directory creation.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_create(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).map_err(|e| Error::Storage {
            operation: "create_store_dir".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self { base_path })
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the file path for a key.
    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if !Self::is_safe_key(key) {
            return Err(Error::InvalidInput(format!(
                "store key contains invalid characters: {key}"
            )));
        }
        Ok(self.base_path.join(format!("{key}.json")))
    }

    /// Checks if a key is safe to use as a filename (no path traversal).
    fn is_safe_key(key: &str) -> bool {
        !key.is_empty()
            && key.len() <= 255
            && key
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;

        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Storage {
                operation: "read_store_file".to_string(),
                cause: e.to_string(),
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;

        fs::create_dir_all(&self.base_path).map_err(|e| Error::Storage {
            operation: "create_store_dir".to_string(),
            cause: e.to_string(),
        })?;

        fs::write(&path, value).map_err(|e| Error::Storage {
            operation: "write_store_file".to_string(),
            cause: e.to_string(),
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage {
                operation: "remove_store_file".to_string(),
                cause: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_and_get() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.set("destinations", "[]").unwrap();
        assert_eq!(store.get("destinations").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_get_missing_key() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        assert!(store.get("destinations").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.set("destinations", "[]").unwrap();
        store.set("destinations", r#"[{"id":1}]"#).unwrap();
        assert_eq!(
            store.get("destinations").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        store.set("destinations", "[]").unwrap();
        store.remove("destinations").unwrap();
        store.remove("destinations").unwrap();
        assert!(store.get("destinations").unwrap().is_none());
    }

    #[test]
    fn test_contains() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        assert!(!store.contains("destinations").unwrap());
        store.set("destinations", "[]").unwrap();
        assert!(store.contains("destinations").unwrap());
    }

    #[test]
    fn test_path_traversal_protection() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        assert!(store.get("../../../etc/passwd").is_err());
        assert!(store.set("dir/file", "x").is_err());
        assert!(store.remove("dir\\file").is_err());
    }

    #[test]
    fn test_safe_key_validation() {
        assert!(FileStore::is_safe_key("destinations"));
        assert!(FileStore::is_safe_key("my-key_123"));

        assert!(!FileStore::is_safe_key(""));
        assert!(!FileStore::is_safe_key("../key"));
        assert!(!FileStore::is_safe_key("key.json"));
        assert!(!FileStore::is_safe_key("key with space"));
    }

    #[test]
    fn test_with_create() {
        let dir = TempDir::new().unwrap();
        let subdir = dir.path().join("nested");

        let store = FileStore::with_create(&subdir);
        assert!(store.is_ok());
        assert!(subdir.exists());
    }

    #[test]
    fn test_lazy_directory_creation_on_set() {
        let dir = TempDir::new().unwrap();
        let subdir = dir.path().join("lazy");
        let store = FileStore::new(&subdir);

        assert!(store.get("destinations").unwrap().is_none());
        store.set("destinations", "[]").unwrap();
        assert!(subdir.exists());
    }
}
