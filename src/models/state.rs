//! Observable controller state.

use super::Destination;

/// Snapshot of a controller's observable state.
///
/// `items` is the controller's copy of the collection, `busy` is true while
/// an operation is in flight, and `failure` holds the most recent failure
/// message, if any. Cancelled requests never populate `failure`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    /// The collection, in insertion order.
    pub items: Vec<Destination>,
    /// Whether an operation is in flight.
    pub busy: bool,
    /// The most recent failure message.
    pub failure: Option<String>,
}

impl SyncState {
    /// Returns true when the state carries no items and no failure.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.items.is_empty() && !self.busy && self.failure.is_none()
    }
}
