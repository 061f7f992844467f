//! Backend collaborator traits.
//!
//! Both push channels deliver the *complete* current state on every change,
//! never a delta. Consumers replace what they hold with each delivery.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;

use crate::chat::{ChatRequest, ChatResponse};
use crate::document::{BlobRef, FileRecord};
use crate::error::BackendError;

/// One full-state delivery of raw records.
pub type RecordBatch = Vec<Value>;

/// A live subscription yielding full-state deliveries.
pub type RecordStream = BoxStream<'static, Result<RecordBatch, BackendError>>;

/// Blob storage holding uploaded files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List the objects directly under `scope`.
    async fn list(&self, scope: &str) -> Result<Vec<BlobRef>, BackendError>;

    /// Read the metadata of one listed object.
    async fn metadata(&self, item: &BlobRef) -> Result<FileRecord, BackendError>;
}

/// Push channel of processing-status records, keyed by user.
pub trait StatusChannel: Send + Sync {
    /// Subscribe to a user's statuses, ordered by `updated_at` descending.
    ///
    /// Each item is the complete current set of `ProcessingStatus` records.
    fn subscribe(&self, user_id: &str) -> RecordStream;
}

/// Push channel of chat messages, keyed by session.
pub trait MessageStore: Send + Sync {
    /// Subscribe to a session's messages, ordered by `createdAt` ascending.
    ///
    /// Each item is the complete current message list.
    fn subscribe(&self, session_id: &str) -> RecordStream;
}

/// The remote chat operation.
#[async_trait]
pub trait ChatFunction: Send + Sync {
    /// Run the assistant on a prompt.
    ///
    /// The persisted messages arrive through the [`MessageStore`], not here.
    async fn call(&self, request: ChatRequest) -> Result<ChatResponse, BackendError>;

    /// Name used in logs.
    fn name(&self) -> &str {
        "chat"
    }
}
