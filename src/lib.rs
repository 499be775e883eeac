//! # Waypost
//!
//! A client-side synchronization engine for destination catalogs.
//!
//! Waypost keeps an in-memory collection of destination records consistent
//! with an external resource — a JSON HTTP API or a local key-value store —
//! through a small controller that survives partial failures by re-syncing
//! with the backing store.
//!
//! ## Features
//!
//! - Pluggable backends behind one trait (HTTP, preconfigured REST client,
//!   persistent file store, session-scoped memory store)
//! - A synchronization controller with a `{items, busy, failure}` state
//!   machine and automatic reconciliation after failed mutations
//! - Explicit request cancellation (last caller wins, superseded results
//!   are discarded silently)
//! - A typed one-shot fetcher for read-only catalog documents
//!
//! ## Example
//!
//! ```rust,ignore
//! use waypost::{SessionBackend, SyncController};
//!
//! let mut controller = SyncController::new(SessionBackend::in_memory());
//! controller.mount().await;
//! controller.create(DestinationDraft::new("Mars", "The red planet")).await;
//! assert_eq!(controller.items().len(), 1);
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod backend;
pub mod cancel;
pub mod config;
pub mod models;
pub mod services;
pub mod store;

// Re-exports for convenience
pub use backend::{
    AnyBackend, CollectionBackend, HttpBackend, LocalBackend, RestBackend, RestHttpConfig,
    SessionBackend, StoreBackend,
};
pub use cancel::{CancelSource, CancelToken};
pub use config::{ApiConfig, BackendKind, WaypostConfig};
pub use models::{
    CatalogDocument, Destination, DestinationDraft, DestinationPatch, SyncState,
    ValidationIssue, ValidationReport,
};
pub use services::{Fetcher, SyncController};
pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Fallback failure message for errors that carry no usable cause text.
pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Error type for waypost operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Transport` | Network failures, non-success HTTP statuses, undecodable responses |
/// | `Storage` | Key-value store writes fail, persisted payloads cannot be encoded |
/// | `NotFound` | HTTP backends receive a 404 for an update target |
/// | `InvalidInput` | Malformed configuration values, rejected drafts |
/// | `Cancelled` | A request was superseded or its owner went away |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A network-level failure.
    ///
    /// Raised when:
    /// - The HTTP request cannot be sent (connect, timeout, DNS)
    /// - The server answers with a non-success status
    /// - The response body cannot be decoded as JSON
    #[error("transport failure in '{operation}': {cause}")]
    Transport {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// A key-value store failure.
    ///
    /// Raised when:
    /// - A store write fails (I/O error, unwritable directory)
    /// - A collection cannot be encoded for persistence
    ///
    /// Corrupt persisted payloads are NOT an error: storage backends degrade
    /// to an empty collection and log a warning instead.
    #[error("storage failure in '{operation}': {cause}")]
    Storage {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// The targeted record does not exist.
    ///
    /// Raised when an HTTP backend receives a 404 for `update`. Storage
    /// backends never raise this: an absent update target is a no-op, and
    /// `delete` is idempotent on every backend.
    #[error("destination {id} not found")]
    NotFound {
        /// The record id that was targeted.
        id: u64,
    },

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A configuration value cannot be parsed
    /// - A draft fails validation before reaching a backend
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The request was cancelled.
    ///
    /// Raised when a newer call of the same kind supersedes an in-flight
    /// request, or the owning scope was dropped. Consumers swallow this
    /// variant: it never populates a failure slot.
    #[error("request cancelled")]
    Cancelled,
}

impl Error {
    /// Returns true for cancellation-class errors.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the text that belongs in a failure slot.
    ///
    /// Transport and storage failures report their underlying cause verbatim;
    /// other variants report their display form. An error with no usable text
    /// falls back to the [`UNKNOWN_ERROR`] sentinel.
    #[must_use]
    pub fn failure_message(&self) -> String {
        let message = match self {
            Self::Transport { cause, .. } | Self::Storage { cause, .. } => cause.clone(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        }
    }
}

/// Result type alias for waypost operations.
pub type Result<T> = std::result::Result<T, Error>;
