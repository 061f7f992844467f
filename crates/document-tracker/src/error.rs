//! Error types for the document tracker.

use thiserror::Error;

/// Errors that can occur when setting up a tracker.
///
/// Runtime failures of the listing or the status stream are never reported
/// here: they degrade to empty deliveries.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
