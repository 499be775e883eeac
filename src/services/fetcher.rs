//! Typed one-shot fetcher.
//!
//! A [`Fetcher`] GETs one URL and decodes the body into a typed value,
//! exposing the same `{data, busy, failure}` shape and failure policy as
//! the controller. Re-invoking `fetch` cancels the request still in
//! flight; a superseded request settles silently.
//!
//! Combined with [`CatalogDocument`](crate::models::CatalogDocument) this
//! covers read-only static catalogs (`GET {base}data.json`, ids
//! synthesized in list order).

use crate::backend::{transport_error, with_cancellation};
use crate::cancel::{CancelSource, CancelToken};
use crate::{Error, Result};
use serde::de::DeserializeOwned;

/// One-shot typed fetcher.
pub struct Fetcher<T> {
    /// URL fetched on every invocation.
    url: String,
    /// HTTP client.
    client: reqwest::Client,
    /// The decoded value, once a fetch succeeded.
    data: Option<T>,
    /// Whether a fetch is in flight.
    busy: bool,
    /// The most recent failure message.
    failure: Option<String>,
    /// Source for the in-flight fetch, if any.
    cancel: Option<CancelSource>,
}

impl<T: DeserializeOwned> Fetcher<T> {
    /// Creates a fetcher for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            data: None,
            busy: false,
            failure: None,
            cancel: None,
        }
    }

    /// Fetches and decodes the document.
    ///
    /// Cancels a previous invocation still in flight; the superseded result
    /// is discarded without touching `failure`.
    pub async fn fetch(&mut self) {
        self.busy = true;
        self.failure = None;

        let token = self.arm_token();
        match with_cancellation(&token, get_json::<T>(&self.client, &self.url)).await {
            Ok(value) => self.data = Some(value),
            Err(e) if e.is_cancelled() => {},
            Err(e) => self.failure = Some(e.failure_message()),
        }

        self.busy = false;
    }

    /// Aborts the in-flight fetch, if any.
    pub fn abort(&mut self) {
        self.cancel = None;
    }

    /// Returns the fetched value, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Consumes the fetcher, returning the fetched value.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Returns true while a fetch is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Returns the most recent failure message.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Returns the fetched URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn arm_token(&mut self) -> CancelToken {
        let source = CancelSource::new();
        let token = source.token();
        self.cancel = Some(source);
        token
    }
}

async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| transport_error("fetch", "get", &e))?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!(
            backend = "fetch",
            url = url,
            status = status.as_u16(),
            "fetch returned error status"
        );
        return Err(Error::Transport {
            operation: "get".to_string(),
            cause: format!("HTTP {}", status.as_u16()),
        });
    }

    response.json().await.map_err(|e| {
        tracing::error!(backend = "fetch", url = url, error = %e, "Failed to decode document");
        Error::Transport {
            operation: "get".to_string(),
            cause: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CatalogDocument;

    #[test]
    fn test_initial_state() {
        let fetcher: Fetcher<CatalogDocument> = Fetcher::new("http://localhost:3000/data.json");
        assert!(fetcher.data().is_none());
        assert!(!fetcher.is_busy());
        assert!(fetcher.failure().is_none());
        assert_eq!(fetcher.url(), "http://localhost:3000/data.json");
    }

    #[tokio::test]
    async fn test_aborted_fetch_is_silent() {
        let mut fetcher: Fetcher<CatalogDocument> =
            Fetcher::new("http://localhost:3000/data.json");

        // Arm a token and cancel it before the request is polled; the fetch
        // must settle without recording a failure.
        let token = fetcher.arm_token();
        fetcher.abort();
        assert!(token.is_cancelled());

        let result =
            with_cancellation(&token, get_json::<CatalogDocument>(
                &reqwest::Client::new(),
                "http://localhost:3000/data.json",
            ))
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
