//! Request cancellation.
//!
//! A [`CancelSource`] is held by the caller that owns a request; the
//! matching [`CancelToken`] travels into the backend call. Re-arming a
//! source (or dropping it) cancels the outstanding token, which gives
//! last-caller-wins semantics for re-invoked requests and unmount semantics
//! when the owning scope goes away. Cancellation is the only interruption
//! mechanism: there are no deadlines.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Debug)]
struct Shared {
    cancelled: AtomicBool,
    notify: Notify,
}

impl Shared {
    const fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            notify: Notify::const_new(),
        }
    }
}

/// The cancelling side of a request.
///
/// Dropping the source cancels its token.
#[derive(Debug)]
pub struct CancelSource {
    shared: Arc<Shared>,
}

impl CancelSource {
    /// Creates a new, un-cancelled source.
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
        }
    }

    /// Returns a token observing this source.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        CancelToken {
            shared: Some(Arc::clone(&self.shared)),
        }
    }

    /// Cancels the outstanding token.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        self.shared.notify.notify_waiters();
    }

    /// Returns true once [`cancel`](Self::cancel) has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancelSource {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// The observing side of a request.
///
/// Cloned into backend calls; checked at suspension points.
#[derive(Debug, Clone)]
pub struct CancelToken {
    shared: Option<Arc<Shared>>,
}

impl CancelToken {
    /// Returns a token that can never be cancelled.
    ///
    /// Used for calls outside the cancellation rule: storage backends and
    /// mutations.
    #[must_use]
    pub const fn never() -> Self {
        Self { shared: None }
    }

    /// Returns true once the matching source cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.shared
            .as_ref()
            .is_some_and(|shared| shared.cancelled.load(Ordering::SeqCst))
    }

    /// Waits until the matching source cancels.
    ///
    /// Never resolves for a [`never`](Self::never) token.
    pub async fn cancelled(&self) {
        let Some(shared) = &self.shared else {
            std::future::pending::<()>().await;
            return;
        };

        if shared.cancelled.load(Ordering::SeqCst) {
            return;
        }

        let notified = shared.notify.notified();
        tokio::pin!(notified);
        // Register before the re-check so a cancel firing in between
        // cannot be missed. Cancellation is one-way, so one wake suffices.
        if notified.as_mut().enable() || shared.cancelled.load(Ordering::SeqCst) {
            return;
        }
        notified.await;
    }
}
