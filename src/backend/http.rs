//! Fetch-style HTTP backend.
//!
//! Issues one plainly-constructed request per call against a JSON
//! collection API:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `list` | `GET {base}/destinations` |
//! | `create` | `POST {base}/destinations` |
//! | `update` | `PATCH {base}/destinations/{id}` |
//! | `delete` | `DELETE {base}/destinations/{id}` |
//!
//! Non-success statuses map to transport failures carrying `HTTP {status}`
//! as the cause, except 404 on `update` (the record is gone) and 404 on
//! `delete` (idempotent success).

use super::{CollectionBackend, transport_error, with_cancellation};
use crate::cancel::CancelToken;
use crate::models::{Destination, DestinationDraft, DestinationPatch};
use crate::{Error, Result};

/// Fetch-style HTTP backend.
pub struct HttpBackend {
    /// Collection API base URL, without a trailing slash.
    base_url: String,
    /// HTTP client.
    client: reqwest::Client,
}

impl HttpBackend {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "http://localhost:3000";

    /// Creates a new backend against `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Returns the configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/destinations", self.base_url)
    }

    fn record_url(&self, id: u64) -> String {
        format!("{}/destinations/{id}", self.base_url)
    }

    async fn fetch_list(&self) -> Result<Vec<Destination>> {
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(|e| transport_error("http", "list", &e))?;

        let response = check_status("list", response)?;
        decode("list", response).await
    }

    async fn send_create(&self, draft: &DestinationDraft) -> Result<Destination> {
        let response = self
            .client
            .post(self.collection_url())
            .json(draft)
            .send()
            .await
            .map_err(|e| transport_error("http", "create", &e))?;

        let response = check_status("create", response)?;
        decode("create", response).await
    }

    async fn send_update(&self, id: u64, patch: &DestinationPatch) -> Result<Option<Destination>> {
        let response = self
            .client
            .patch(self.record_url(id))
            .json(patch)
            .send()
            .await
            .map_err(|e| transport_error("http", "update", &e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound { id });
        }
        let response = check_status("update", response)?;
        decode("update", response).await.map(Some)
    }

    async fn send_delete(&self, id: u64) -> Result<()> {
        let response = self
            .client
            .delete(self.record_url(id))
            .send()
            .await
            .map_err(|e| transport_error("http", "delete", &e))?;

        // Deleting an absent record is a no-op, not an error.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status("delete", response).map(|_| ())
    }
}

impl CollectionBackend for HttpBackend {
    async fn list(&self, token: &CancelToken) -> Result<Vec<Destination>> {
        with_cancellation(token, self.fetch_list()).await
    }

    async fn create(&self, draft: &DestinationDraft, token: &CancelToken) -> Result<Destination> {
        with_cancellation(token, self.send_create(draft)).await
    }

    async fn update(
        &self,
        id: u64,
        patch: &DestinationPatch,
        token: &CancelToken,
    ) -> Result<Option<Destination>> {
        with_cancellation(token, self.send_update(id, patch)).await
    }

    async fn delete(&self, id: u64, token: &CancelToken) -> Result<()> {
        with_cancellation(token, self.send_delete(id)).await
    }
}

/// Rejects non-success statuses with the `HTTP {status}` cause.
fn check_status(operation: &'static str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    tracing::error!(
        backend = "http",
        operation = operation,
        status = status.as_u16(),
        "API returned error status"
    );
    Err(Error::Transport {
        operation: operation.to_string(),
        cause: format!("HTTP {}", status.as_u16()),
    })
}

/// Decodes a JSON response body.
async fn decode<T: serde::de::DeserializeOwned>(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<T> {
    response.json().await.map_err(|e| {
        tracing::error!(
            backend = "http",
            operation = operation,
            error = %e,
            "Failed to decode API response"
        );
        Error::Transport {
            operation: operation.to_string(),
            cause: e.to_string(),
        }
    })
}
