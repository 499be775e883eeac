//! Synchronization services.
//!
//! Services own observable state and orchestrate backends to keep it
//! consistent with the backing resource.

mod controller;
mod fetcher;

pub use controller::SyncController;
pub use fetcher::Fetcher;
