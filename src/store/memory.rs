//! In-memory session-scoped store.

use crate::Result;
use crate::store::KeyValueStore;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// In-memory store with the lifetime of the process.
///
/// Session-scoped: values disappear when the owning process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when no keys are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned lock only means another accessor panicked mid-write;
        // the map itself is still usable.
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("destinations", "[]").unwrap();
        assert_eq!(store.get("destinations").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_get_missing_key() {
        let store = MemoryStore::new();
        assert!(store.get("destinations").unwrap().is_none());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = MemoryStore::new();
        store.set("destinations", "[]").unwrap();
        store.remove("destinations").unwrap();
        store.remove("destinations").unwrap();
        assert!(store.get("destinations").unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_len() {
        let store = MemoryStore::new();
        assert_eq!(store.len(), 0);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.len(), 2);
    }
}
