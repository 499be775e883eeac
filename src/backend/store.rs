//! Key-value store backend.
//!
//! Persists the whole collection as one JSON array under a single key.
//! Generic over the [`KeyValueStore`] so the persistent and session-scoped
//! variants share one implementation, and tests can inject their own store.
//!
//! A corrupt or non-array persisted payload degrades to an empty collection
//! with a warning; it is never surfaced as an error. Save failures are.

use super::CollectionBackend;
use crate::cancel::CancelToken;
use crate::models::{Destination, DestinationDraft, DestinationPatch};
use crate::store::{FileStore, KeyValueStore, MemoryStore};
use crate::{Error, Result};
use std::path::PathBuf;

/// Default store key for the collection.
pub const DEFAULT_COLLECTION_KEY: &str = "destinations";

/// Backend persisting the collection in a key-value store.
pub struct StoreBackend<S> {
    /// The injected store.
    store: S,
    /// Key the collection lives under.
    key: String,
}

/// Persistent variant, backed by a [`FileStore`].
pub type LocalBackend = StoreBackend<FileStore>;

/// Session-scoped variant, backed by a [`MemoryStore`].
pub type SessionBackend = StoreBackend<MemoryStore>;

impl<S: KeyValueStore> StoreBackend<S> {
    /// Creates a backend over an injected store, using the default key.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: DEFAULT_COLLECTION_KEY.to_string(),
        }
    }

    /// Sets the key the collection lives under.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Returns the injected store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the collection key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the collection, degrading corrupt content to empty.
    fn load(&self) -> Vec<Destination> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "store read failed, starting empty");
                return Vec::new();
            },
        };

        match serde_json::from_str::<Vec<Destination>>(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "corrupt persisted collection, starting empty"
                );
                Vec::new()
            },
        }
    }

    /// Persists the collection.
    fn save(&self, items: &[Destination]) -> Result<()> {
        let raw = serde_json::to_string(items).map_err(|e| Error::Storage {
            operation: "encode_collection".to_string(),
            cause: e.to_string(),
        })?;
        self.store.set(&self.key, &raw)
    }

    /// Returns the id the next created record receives.
    fn next_id(items: &[Destination]) -> u64 {
        items.iter().map(|item| item.id).max().unwrap_or(0) + 1
    }
}

impl StoreBackend<FileStore> {
    /// Creates a persistent backend rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn persistent(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(FileStore::with_create(dir)?))
    }
}

impl StoreBackend<MemoryStore> {
    /// Creates a fresh session-scoped backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: KeyValueStore> CollectionBackend for StoreBackend<S> {
    async fn list(&self, _token: &CancelToken) -> Result<Vec<Destination>> {
        Ok(self.load())
    }

    async fn create(&self, draft: &DestinationDraft, _token: &CancelToken) -> Result<Destination> {
        let mut items = self.load();
        let record = draft.clone().into_destination(Self::next_id(&items));
        items.push(record.clone());
        self.save(&items)?;
        Ok(record)
    }

    async fn update(
        &self,
        id: u64,
        patch: &DestinationPatch,
        _token: &CancelToken,
    ) -> Result<Option<Destination>> {
        let mut items = self.load();
        let Some(target) = items.iter_mut().find(|item| item.id == id) else {
            // Absent target: the collection is unchanged and nothing fails.
            return Ok(None);
        };
        patch.apply(target);
        let updated = target.clone();
        self.save(&items)?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: u64, _token: &CancelToken) -> Result<()> {
        let mut items = self.load();
        items.retain(|item| item.id != id);
        self.save(&items)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed(backend: &SessionBackend, items: &[(u64, &str, &str)]) {
        let collection: Vec<Destination> = items
            .iter()
            .map(|(id, name, description)| Destination {
                id: *id,
                name: (*name).to_string(),
                description: (*description).to_string(),
            })
            .collect();
        backend.save(&collection).unwrap();
    }

    #[tokio::test]
    async fn test_list_empty_store() {
        let backend = SessionBackend::in_memory();
        let items = backend.list(&CancelToken::never()).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_create_assigns_max_plus_one() {
        let backend = SessionBackend::in_memory();
        seed(
            &backend,
            &[(1, "a", "a"), (2, "b", "b"), (5, "c", "c")],
        );

        let record = backend
            .create(
                &DestinationDraft::new("Europa", "Icy moon of Jupiter"),
                &CancelToken::never(),
            )
            .await
            .unwrap();

        assert_eq!(record.id, 6);
    }

    #[tokio::test]
    async fn test_create_appends_in_order() {
        let backend = SessionBackend::in_memory();

        for name in ["Moon", "Mars", "Europa"] {
            backend
                .create(&DestinationDraft::new(name, name), &CancelToken::never())
                .await
                .unwrap();
        }

        let items = backend.list(&CancelToken::never()).await.unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Moon", "Mars", "Europa"]);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[2].id, 3);
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let backend = SessionBackend::in_memory();
        seed(&backend, &[(1, "Moon", "old"), (2, "Mars", "untouched")]);

        let updated = backend
            .update(1, &DestinationPatch::describe("Edited"), &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(updated.unwrap().description, "Edited");
        let items = backend.list(&CancelToken::never()).await.unwrap();
        assert_eq!(items[0].description, "Edited");
        assert_eq!(items[1].description, "untouched");
    }

    #[tokio::test]
    async fn test_update_absent_id_is_noop() {
        let backend = SessionBackend::in_memory();
        seed(&backend, &[(1, "Moon", "x")]);

        let result = backend
            .update(99, &DestinationPatch::rename("y"), &CancelToken::never())
            .await
            .unwrap();

        assert!(result.is_none());
        let items = backend.list(&CancelToken::never()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Moon");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let backend = SessionBackend::in_memory();
        seed(&backend, &[(1, "Moon", "x"), (2, "Mars", "y")]);

        backend.delete(1, &CancelToken::never()).await.unwrap();
        backend.delete(1, &CancelToken::never()).await.unwrap();
        backend.delete(999, &CancelToken::never()).await.unwrap();

        let items = backend.list(&CancelToken::never()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 2);
    }

    #[tokio::test]
    async fn test_corrupt_payload_degrades_to_empty() {
        let backend = SessionBackend::in_memory();
        backend
            .store()
            .set(DEFAULT_COLLECTION_KEY, "{not json")
            .unwrap();

        let items = backend.list(&CancelToken::never()).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_non_array_payload_degrades_to_empty() {
        let backend = SessionBackend::in_memory();
        backend
            .store()
            .set(DEFAULT_COLLECTION_KEY, r#"{"id": 1}"#)
            .unwrap();

        let items = backend.list(&CancelToken::never()).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_payload_resets_on_next_create() {
        let backend = SessionBackend::in_memory();
        backend
            .store()
            .set(DEFAULT_COLLECTION_KEY, "not even close")
            .unwrap();

        let record = backend
            .create(
                &DestinationDraft::new("Moon", "Earth's natural satellite"),
                &CancelToken::never(),
            )
            .await
            .unwrap();

        assert_eq!(record.id, 1);
        let items = backend.list(&CancelToken::never()).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_persistent_backend_survives_reopen() {
        let dir = TempDir::new().unwrap();

        {
            let backend = LocalBackend::persistent(dir.path()).unwrap();
            backend
                .create(
                    &DestinationDraft::new("Moon", "Earth's natural satellite"),
                    &CancelToken::never(),
                )
                .await
                .unwrap();
        }

        let backend = LocalBackend::persistent(dir.path()).unwrap();
        let items = backend.list(&CancelToken::never()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Moon");
    }

    #[tokio::test]
    async fn test_custom_key_isolates_collections() {
        let dir = TempDir::new().unwrap();
        let first = LocalBackend::persistent(dir.path()).unwrap();
        let second = LocalBackend::persistent(dir.path())
            .unwrap()
            .with_key("archived");

        first
            .create(&DestinationDraft::new("Moon", "x"), &CancelToken::never())
            .await
            .unwrap();

        assert_eq!(second.list(&CancelToken::never()).await.unwrap().len(), 0);
        assert_eq!(first.list(&CancelToken::never()).await.unwrap().len(), 1);
    }
}
