//! Error types for chat submission.

use std::time::Duration;

use assistant_core::BackendError;
use thiserror::Error;

/// Text shown when a failure carries no usable message.
pub const DEFAULT_ERROR_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// Reasons a submission did not go through.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The chat call itself failed.
    #[error("chat call failed: {0}")]
    Backend(#[from] BackendError),

    /// The server answered, but without success or without data.
    #[error("chat rejected: {0}")]
    Rejected(String),

    /// No answer within the configured timeout.
    #[error("chat call timed out after {0:?}")]
    Timeout(Duration),
}

impl SubmitError {
    /// Text to show the user.
    ///
    /// Only a server-provided message is passed through; everything else
    /// gets the generic apology.
    pub fn user_message(&self) -> &str {
        match self {
            SubmitError::Rejected(message) if !message.trim().is_empty() => message,
            _ => DEFAULT_ERROR_TEXT,
        }
    }
}
