//! Document tracking for the assistant's ingestion panel.
//!
//! This crate merges two independent sources into one view of the documents
//! a user knows about:
//!
//! - [`ListingPoller`] - re-enumerates the user's stored files on a timer
//! - [`StatusListener`] - receives the full processing-status set on every change
//! - [`Reconciler`] - joins both, and detects each phase change exactly once
//! - [`DocumentTracker`] - runs the three for one user and notifies on transitions
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use assistant_core::{BlobStore, NotificationSink, StatusChannel};
//! use document_tracker::{DocumentTracker, TrackerConfig};
//!
//! # async fn example(
//! #     store: Arc<dyn BlobStore>,
//! #     channel: Arc<dyn StatusChannel>,
//! #     sink: Arc<dyn NotificationSink>,
//! # ) -> Result<(), document_tracker::TrackerError> {
//! let tracker = DocumentTracker::new(store, channel, sink, TrackerConfig::default())?;
//! let handle = tracker.start("user-123");
//!
//! let mut views = handle.views();
//! while views.changed().await.is_ok() {
//!     for doc in views.borrow().iter() {
//!         println!("{} - {} - {}", doc.file_name, doc.formatted_size(), doc.status_text());
//!     }
//! }
//!
//! handle.cancel();
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod poller;
mod reconciler;
mod status;
mod tracker;

pub use config::{TrackerConfig, DEFAULT_CHANNEL_CAPACITY, DEFAULT_POLL_INTERVAL};
pub use error::TrackerError;
pub use poller::ListingPoller;
pub use reconciler::{Reconciler, Transition, UNKNOWN_ERROR};
pub use status::{normalize_statuses, StatusListener};
pub use tracker::{DocumentTracker, TrackerHandle};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
