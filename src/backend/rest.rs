//! Preconfigured REST client backend.
//!
//! The second HTTP style: instead of constructing each request from
//! scratch, a single shared client is built once from [`RestHttpConfig`]
//! (base URL, default JSON headers, request and connect timeouts, with
//! environment overrides) and every call goes through it. Wire protocol
//! and error mapping match [`HttpBackend`](super::HttpBackend).

use super::{CollectionBackend, transport_error, with_cancellation};
use crate::cancel::CancelToken;
use crate::config::ApiConfig;
use crate::models::{Destination, DestinationDraft, DestinationPatch};
use crate::{Error, Result};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::time::Duration;

/// HTTP client configuration for the REST backend.
#[derive(Debug, Clone)]
pub struct RestHttpConfig {
    /// Collection API base URL.
    pub base_url: String,
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for RestHttpConfig {
    fn default() -> Self {
        Self {
            base_url: super::HttpBackend::DEFAULT_BASE_URL.to_string(),
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl RestHttpConfig {
    /// Loads HTTP configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Loads HTTP configuration from the API section of the config file.
    #[must_use]
    pub fn from_config(config: &ApiConfig) -> Self {
        let mut settings = Self::default();
        settings.base_url.clone_from(&config.base_url);
        if let Some(timeout_ms) = config.timeout_ms {
            settings.timeout_ms = timeout_ms;
        }
        if let Some(connect_timeout_ms) = config.connect_timeout_ms {
            settings.connect_timeout_ms = connect_timeout_ms;
        }
        settings
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("WAYPOST_API_BASE_URL") {
            if !v.trim().is_empty() {
                self.base_url = v;
            }
        }
        if let Ok(v) = std::env::var("WAYPOST_API_TIMEOUT_MS") {
            if let Ok(timeout_ms) = v.parse::<u64>() {
                self.timeout_ms = timeout_ms;
            }
        }
        if let Ok(v) = std::env::var("WAYPOST_API_CONNECT_TIMEOUT_MS") {
            if let Ok(connect_timeout_ms) = v.parse::<u64>() {
                self.connect_timeout_ms = connect_timeout_ms;
            }
        }
        self
    }
}

/// Builds the shared HTTP client for REST requests with configured
/// timeouts and default headers.
#[must_use]
pub fn build_rest_client(config: &RestHttpConfig) -> reqwest::Client {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build REST HTTP client: {err}");
        reqwest::Client::new()
    })
}

/// Preconfigured REST client backend.
pub struct RestBackend {
    /// Client configuration.
    config: RestHttpConfig,
    /// Shared HTTP client.
    client: reqwest::Client,
}

impl RestBackend {
    /// Creates a backend from environment configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RestHttpConfig::from_env())
    }

    /// Creates a backend from an explicit configuration.
    #[must_use]
    pub fn with_config(config: RestHttpConfig) -> Self {
        let config = RestHttpConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };
        let client = build_rest_client(&config);
        Self { config, client }
    }

    /// Sets the base URL, rebuilding nothing else.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/destinations", self.config.base_url)
    }

    fn record_url(&self, id: u64) -> String {
        format!("{}/destinations/{id}", self.config.base_url)
    }

    async fn fetch_list(&self) -> Result<Vec<Destination>> {
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(|e| transport_error("rest", "list", &e))?;

        let response = check_status("list", response)?;
        response.json().await.map_err(|e| decode_error("list", &e))
    }

    async fn send_create(&self, draft: &DestinationDraft) -> Result<Destination> {
        let response = self
            .client
            .post(self.collection_url())
            .json(draft)
            .send()
            .await
            .map_err(|e| transport_error("rest", "create", &e))?;

        let response = check_status("create", response)?;
        response
            .json()
            .await
            .map_err(|e| decode_error("create", &e))
    }

    async fn send_update(&self, id: u64, patch: &DestinationPatch) -> Result<Option<Destination>> {
        let response = self
            .client
            .patch(self.record_url(id))
            .json(patch)
            .send()
            .await
            .map_err(|e| transport_error("rest", "update", &e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound { id });
        }
        let response = check_status("update", response)?;
        response
            .json()
            .await
            .map(Some)
            .map_err(|e| decode_error("update", &e))
    }

    async fn send_delete(&self, id: u64) -> Result<()> {
        let response = self
            .client
            .delete(self.record_url(id))
            .send()
            .await
            .map_err(|e| transport_error("rest", "delete", &e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status("delete", response).map(|_| ())
    }
}

impl Default for RestBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionBackend for RestBackend {
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

fn check_status(operation: &'static str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    tracing::error!(
        backend = "rest",
        operation = operation,
        status = status.as_u16(),
        "API returned error status"
    );
    Err(Error::Transport {
        operation: operation.to_string(),
        cause: format!("HTTP {}", status.as_u16()),
    })
}

fn decode_error(operation: &'static str, e: &reqwest::Error) -> Error {
    tracing::error!(
        backend = "rest",
        operation = operation,
        error = %e,
        "Failed to decode API response"
    );
    Error::Transport {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RestHttpConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.connect_timeout_ms, 3_000);
    }

    #[test]
    fn test_backend_configuration() {
        let backend = RestBackend::with_config(RestHttpConfig {
            base_url: "http://localhost:4000/".to_string(),
            ..RestHttpConfig::default()
        });
        assert_eq!(backend.base_url(), "http://localhost:4000");
        assert_eq!(
            backend.collection_url(),
            "http://localhost:4000/destinations"
        );
        assert_eq!(backend.record_url(3), "http://localhost:4000/destinations/3");
    }

    #[test]
    fn test_with_base_url() {
        let backend = RestBackend::with_config(RestHttpConfig::default())
            .with_base_url("http://api.example.test/");
        assert_eq!(backend.base_url(), "http://api.example.test");
    }

    #[test]
    fn test_from_api_config() {
        let api = ApiConfig {
            base_url: "http://localhost:5000".to_string(),
            timeout_ms: Some(1_000),
            connect_timeout_ms: None,
        };
        let config = RestHttpConfig::from_config(&api);
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout_ms, 1_000);
        assert_eq!(config.connect_timeout_ms, 3_000);
    }

    #[tokio::test]
    async fn test_cancelled_list_is_silent() {
        let source = crate::cancel::CancelSource::new();
        let token = source.token();
        source.cancel();

        let backend = RestBackend::with_config(RestHttpConfig::default());
        let result = backend.list(&token).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
