//! Collection backends.
//!
//! A backend is the pluggable I/O provider behind a
//! [`SyncController`](crate::services::SyncController). Four variants are
//! provided, selected by a [`BackendKind`](crate::config::BackendKind) tag at
//! construction time:
//!
//! | Variant | Transport | Lifetime |
//! |---------|-----------|----------|
//! | [`HttpBackend`] | per-request HTTP | server-side |
//! | [`RestBackend`] | preconfigured shared HTTP client | server-side |
//! | [`LocalBackend`] | file-backed key-value store | persistent |
//! | [`SessionBackend`] | in-memory key-value store | process |
//!
//! HTTP variants honor the cancellation token on `list`; storage variants
//! complete synchronously and have nothing to cancel.

mod http;
mod rest;
mod store;

pub use http::HttpBackend;
pub use rest::{RestBackend, RestHttpConfig, build_rest_client};
pub use store::{LocalBackend, SessionBackend, StoreBackend};

use crate::cancel::CancelToken;
use crate::config::{BackendKind, WaypostConfig};
use crate::models::{Destination, DestinationDraft, DestinationPatch};
use crate::store::{FileStore, MemoryStore};
use crate::{Error, Result};
use std::future::Future;

/// Trait for collection backends.
///
/// Storage implementations complete without suspending; HTTP
/// implementations suspend on the wire and observe the token.
#[allow(async_fn_in_trait)]
pub trait CollectionBackend: Send + Sync {
    /// Lists the full collection.
    async fn list(&self, token: &CancelToken) -> Result<Vec<Destination>>;

    /// Creates a record from a draft. The backend assigns the id.
    async fn create(&self, draft: &DestinationDraft, token: &CancelToken) -> Result<Destination>;

    /// Applies a partial update to a record.
    ///
    /// Returns `Ok(None)` when a storage backend finds no record under `id`
    /// (the collection is unchanged). HTTP backends surface the server's 404
    /// as [`Error::NotFound`] instead.
    async fn update(
        &self,
        id: u64,
        patch: &DestinationPatch,
        token: &CancelToken,
    ) -> Result<Option<Destination>>;

    /// Deletes a record. Idempotent: deleting an absent id succeeds.
    async fn delete(&self, id: u64, token: &CancelToken) -> Result<()>;
}

/// Races `future` against the token; a cancelled token wins and the
/// in-flight result is discarded.
pub(crate) async fn with_cancellation<T>(
    token: &CancelToken,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        () = token.cancelled() => Err(Error::Cancelled),
        result = future => result,
    }
}

/// Maps a reqwest send failure to a transport error with a classified cause.
pub(crate) fn transport_error(
    backend: &'static str,
    operation: &'static str,
    e: &reqwest::Error,
) -> Error {
    let error_kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connect"
    } else if e.is_request() {
        "request"
    } else {
        "unknown"
    };
    tracing::error!(
        backend = backend,
        operation = operation,
        error = %e,
        error_kind = error_kind,
        "HTTP request failed"
    );
    Error::Transport {
        operation: operation.to_string(),
        cause: format!("{error_kind} error: {e}"),
    }
}

/// A backend variant selected at construction time.
///
/// Tagged wrapper around the four concrete backends so runtime selection
/// does not need trait objects.
pub enum AnyBackend {
    /// Fetch-style HTTP backend.
    Http(HttpBackend),
    /// Preconfigured REST client backend.
    Rest(RestBackend),
    /// Persistent file-backed backend.
    Local(LocalBackend),
    /// Session-scoped in-memory backend.
    Session(SessionBackend),
}

impl AnyBackend {
    /// Builds the backend selected by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the local store directory cannot be created.
    pub fn from_config(config: &WaypostConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Http => Ok(Self::Http(HttpBackend::new(config.api.base_url.clone()))),
            BackendKind::Rest => Ok(Self::Rest(RestBackend::with_config(
                RestHttpConfig::from_config(&config.api),
            ))),
            BackendKind::Local => {
                let store = FileStore::with_create(&config.data_dir)?;
                Ok(Self::Local(
                    StoreBackend::new(store).with_key(config.collection_key.clone()),
                ))
            },
            BackendKind::Session => Ok(Self::Session(
                StoreBackend::new(MemoryStore::new()).with_key(config.collection_key.clone()),
            )),
        }
    }

    /// Returns the tag of the wrapped variant.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Http(_) => BackendKind::Http,
            Self::Rest(_) => BackendKind::Rest,
            Self::Local(_) => BackendKind::Local,
            Self::Session(_) => BackendKind::Session,
        }
    }
}

impl CollectionBackend for AnyBackend {
    async fn list(&self, token: &CancelToken) -> Result<Vec<Destination>> {
        match self {
            Self::Http(backend) => backend.list(token).await,
            Self::Rest(backend) => backend.list(token).await,
            Self::Local(backend) => backend.list(token).await,
            Self::Session(backend) => backend.list(token).await,
        }
    }

    async fn create(&self, draft: &DestinationDraft, token: &CancelToken) -> Result<Destination> {
        match self {
            Self::Http(backend) => backend.create(draft, token).await,
            Self::Rest(backend) => backend.create(draft, token).await,
            Self::Local(backend) => backend.create(draft, token).await,
            Self::Session(backend) => backend.create(draft, token).await,
        }
    }

    async fn update(
        &self,
        id: u64,
        patch: &DestinationPatch,
        token: &CancelToken,
    ) -> Result<Option<Destination>> {
        match self {
            Self::Http(backend) => backend.update(id, patch, token).await,
            Self::Rest(backend) => backend.update(id, patch, token).await,
            Self::Local(backend) => backend.update(id, patch, token).await,
            Self::Session(backend) => backend.update(id, patch, token).await,
        }
    }

    async fn delete(&self, id: u64, token: &CancelToken) -> Result<()> {
        match self {
            Self::Http(backend) => backend.delete(id, token).await,
            Self::Rest(backend) => backend.delete(id, token).await,
            Self::Local(backend) => backend.delete(id, token).await,
            Self::Session(backend) => backend.delete(id, token).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaypostConfig;

    #[test]
    fn test_from_config_selects_session_variant() {
        let config = WaypostConfig::default().with_backend(BackendKind::Session);
        let backend = AnyBackend::from_config(&config).unwrap();
        assert_eq!(backend.kind(), BackendKind::Session);
    }

    #[test]
    fn test_from_config_selects_http_variant() {
        let config = WaypostConfig::default().with_backend(BackendKind::Http);
        let backend = AnyBackend::from_config(&config).unwrap();
        assert_eq!(backend.kind(), BackendKind::Http);
    }

    #[tokio::test]
    async fn test_with_cancellation_prefers_cancelled_token() {
        let source = crate::cancel::CancelSource::new();
        let token = source.token();
        source.cancel();

        let result = with_cancellation(&token, async { Ok(42) }).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_with_cancellation_passes_through_result() {
        let token = CancelToken::never();
        let result = with_cancellation(&token, async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
