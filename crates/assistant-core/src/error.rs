//! Error types for backend collaborators.

use thiserror::Error;

/// Errors reported by backend collaborators.
///
/// None of these are fatal to the client. Listeners degrade them to empty
/// data and the submission gate turns them into a user-visible notice.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never reached the backend or the connection dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// A record could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The requested object does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The caller is not signed in or lacks access to the scope.
    #[error("unauthorized")]
    Unauthorized,

    /// The subscription was closed by the backend.
    #[error("subscription closed")]
    Closed,
}
