//! Core types and collaborator traits for the document assistant.
//!
//! This crate provides the shared vocabulary used by the document tracker
//! and the chat feed. It defines:
//!
//! - [`FileRecord`] / [`ProcessingStatus`] / [`DocumentView`] - Document listing and pipeline state
//! - [`Message`] / [`ChatRequest`] / [`ChatResponse`] - Chat feed records and the remote chat call
//! - [`BlobStore`], [`StatusChannel`], [`MessageStore`], [`ChatFunction`] - Backend collaborators
//! - [`Notification`] / [`NotificationSink`] - User-visible notices
//! - [`Subscription`] - Idempotent cancellation handle for listeners and pollers
//!
//! # Example
//!
//! ```rust
//! use assistant_core::{Phase, ProcessingStatus};
//!
//! let status: ProcessingStatus = serde_json::from_str(
//!     r#"{"user_id":"u1","file_name":"a.pdf","status":"vectorizing","progress_percentage":60}"#,
//! ).unwrap();
//!
//! assert_eq!(status.phase, Phase::Vectorizing);
//! assert_eq!(status.progress_percent, Some(60));
//! ```

mod backend;
mod chat;
mod document;
mod error;
mod notification;
mod subscription;

pub use backend::{BlobStore, ChatFunction, MessageStore, RecordBatch, RecordStream, StatusChannel};
pub use chat::{AssistantItem, ChatRequest, ChatResponse, Message, MessageBody, Role};
pub use document::{
    format_file_size, user_scope, BlobRef, DocumentView, FileRecord, Phase, ProcessingStatus,
    USER_DOCUMENTS_ROOT,
};
pub use error::BackendError;
pub use notification::{Level, Notification, NotificationSink};
pub use subscription::Subscription;

// Re-export async_trait for collaborator implementations
pub use async_trait::async_trait;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
