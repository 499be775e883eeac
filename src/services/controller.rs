//! Collection synchronization controller.
//!
//! [`SyncController`] keeps an in-memory collection consistent with one
//! backend. The observable state is `{items, busy, failure}`:
//!
//! - every operation raises `busy` and clears `failure` on entry, and
//!   lowers `busy` when it settles;
//! - a failed `refresh` leaves the collection stale but consistent;
//! - a failed mutation records the failure and re-lists, because a backend
//!   may have durably applied the write even though the call reported
//!   failure;
//! - a superseded request settles silently, without touching `failure`.
//!
//! The controller runs on one logical event loop: operations take
//! `&mut self` and interleave only at their I/O suspension points, so no
//! locking is involved. Only `list` participates in cancellation; starting
//! a new `refresh` invalidates the token of the previous one and dropping
//! the controller aborts whatever is still in flight.

use crate::backend::CollectionBackend;
use crate::cancel::{CancelSource, CancelToken};
use crate::models::{Destination, DestinationDraft, DestinationPatch, SyncState};
use std::time::Instant;
use tracing::instrument;

/// Controller synchronizing one collection with one backend.
pub struct SyncController<B> {
    /// The backend this controller reconciles against.
    backend: B,
    /// The collection, in insertion order.
    items: Vec<Destination>,
    /// Whether an operation is in flight.
    busy: bool,
    /// The most recent failure message.
    failure: Option<String>,
    /// Source for the in-flight `list`, if any.
    list_cancel: Option<CancelSource>,
}

impl<B: CollectionBackend> SyncController<B> {
    /// Creates a lazy controller: empty collection, not busy, no failure.
    ///
    /// Call [`mount`](Self::mount) to perform the initial refresh.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self {
            backend,
            items: Vec::new(),
            busy: false,
            failure: None,
            list_cancel: None,
        }
    }

    /// Performs the initial refresh.
    pub async fn mount(&mut self) {
        self.refresh().await;
    }

    /// Re-lists the collection from the backend.
    ///
    /// On success the collection is replaced wholesale. On failure the
    /// collection is left stale and the failure message is recorded. A
    /// superseded request settles silently.
    #[instrument(skip(self), fields(operation = "controller.refresh"))]
    pub async fn refresh(&mut self) {
        let start = Instant::now();
        self.busy = true;
        self.failure = None;

        let token = self.arm_list_token();
        let status = match self.backend.list(&token).await {
            Ok(items) => {
                self.items = items;
                "success"
            },
            Err(e) if e.is_cancelled() => "cancelled",
            Err(e) => {
                self.failure = Some(e.failure_message());
                "error"
            },
        };

        self.busy = false;
        record_operation("refresh", status, start);
    }

    /// Creates a record and appends it to the collection.
    ///
    /// The backend assigns the id; the new record is appended, never
    /// re-sorted. On failure the message is recorded and the collection is
    /// re-listed to reconcile with whatever the backend actually holds.
    #[instrument(skip(self, draft), fields(operation = "controller.create"))]
    pub async fn create(&mut self, draft: DestinationDraft) {
        let start = Instant::now();
        self.busy = true;
        self.failure = None;

        let status = match self.backend.create(&draft, &CancelToken::never()).await {
            Ok(record) => {
                self.items.push(record);
                "success"
            },
            Err(e) if e.is_cancelled() => "cancelled",
            Err(e) => {
                self.failure = Some(e.failure_message());
                self.resync().await;
                "error"
            },
        };

        self.busy = false;
        record_operation("create", status, start);
    }

    /// Applies a partial update to the record with `id`.
    ///
    /// On success only the matching record is replaced; order and the other
    /// records are untouched. A storage no-op (absent id) changes nothing.
    /// On failure the message is recorded and the collection re-listed.
    #[instrument(skip(self, patch), fields(operation = "controller.update", id = id))]
    pub async fn update(&mut self, id: u64, patch: DestinationPatch) {
        let start = Instant::now();
        self.busy = true;
        self.failure = None;

        let status = match self.backend.update(id, &patch, &CancelToken::never()).await {
            Ok(Some(updated)) => {
                if let Some(slot) = self.items.iter_mut().find(|item| item.id == id) {
                    *slot = updated;
                }
                "success"
            },
            Ok(None) => "success",
            Err(e) if e.is_cancelled() => "cancelled",
            Err(e) => {
                self.failure = Some(e.failure_message());
                self.resync().await;
                "error"
            },
        };

        self.busy = false;
        record_operation("update", status, start);
    }

    /// Removes the record with `id` from the collection.
    ///
    /// Idempotent: removing an absent id settles successfully and changes
    /// nothing. On failure the message is recorded and the collection
    /// re-listed.
    #[instrument(skip(self), fields(operation = "controller.remove", id = id))]
    pub async fn remove(&mut self, id: u64) {
        let start = Instant::now();
        self.busy = true;
        self.failure = None;

        let status = match self.backend.delete(id, &CancelToken::never()).await {
            Ok(()) => {
                self.items.retain(|item| item.id != id);
                "success"
            },
            Err(e) if e.is_cancelled() => "cancelled",
            Err(e) => {
                self.failure = Some(e.failure_message());
                self.resync().await;
                "error"
            },
        };

        self.busy = false;
        record_operation("remove", status, start);
    }

    /// Aborts the in-flight `list`, if any.
    pub fn cancel_refresh(&mut self) {
        self.list_cancel = None;
    }

    /// Returns the collection, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[Destination] {
        &self.items
    }

    /// Returns true while an operation is in flight.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.busy
    }

    /// Returns the most recent failure message.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Returns a snapshot of the observable state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        SyncState {
            items: self.items.clone(),
            busy: self.busy,
            failure: self.failure.clone(),
        }
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Re-lists after a failed mutation, keeping the recorded failure.
    ///
    /// The public `refresh` clears `failure` on entry, which would wipe the
    /// message the caller is about to observe; reconciliation only replaces
    /// the items. A failed re-list keeps the stale view.
    async fn resync(&mut self) {
        let token = self.arm_list_token();
        if let Ok(items) = self.backend.list(&token).await {
            self.items = items;
        }
    }

    /// Arms a fresh token for a `list`, cancelling the previous one.
    fn arm_list_token(&mut self) -> CancelToken {
        let source = CancelSource::new();
        let token = source.token();
        // Replacing the source drops (and thereby cancels) the old one.
        self.list_cancel = Some(source);
        token
    }
}

fn record_operation(operation: &'static str, status: &'static str, start: Instant) {
    metrics::counter!(
        "collection_sync_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!("collection_sync_duration_ms", "operation" => operation)
        .record(start.elapsed().as_secs_f64() * 1000.0);
}
