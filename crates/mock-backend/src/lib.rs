//! In-memory backend collaborators for the document assistant.
//!
//! This crate provides test doubles for every collaborator trait in
//! `assistant-core`:
//! - `MemoryBlobStore` - Stored files with injectable listing/metadata failures
//! - `MemoryStatusChannel` - Full-set status pushes per user
//! - `MemoryMessageStore` - Full-list message pushes per session
//! - `EchoChat` / `FailingChat` / `DelayedChat` - Remote chat stand-ins
//! - `RecordingSink` - Collects notifications
//! - `PipelineSimulator` - Walks a file through the processing phases
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use mock_backend::{EchoChat, MemoryMessageStore};
//! use assistant_core::{ChatFunction, ChatRequest};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryMessageStore::new());
//!     let chat = EchoChat::persisting_to(Arc::clone(&store));
//!
//!     let response = chat.call(ChatRequest::new("Hello!", "001", "1")).await.unwrap();
//!     assert!(response.is_success());
//!     assert_eq!(store.len("001"), 2);
//! }
//! ```

mod blob;
mod chat;
mod fanout;
mod messages;
mod pipeline;
mod sink;
mod status;

// Re-export assistant-core types for convenience
pub use assistant_core::{
    BackendError, ChatFunction, ChatRequest, ChatResponse, FileRecord, Message, Notification,
    Phase, ProcessingStatus,
};

pub use blob::MemoryBlobStore;
pub use chat::{DelayedChat, EchoChat, FailingChat, FailingMode};
pub use messages::MemoryMessageStore;
pub use pipeline::{PipelineOutcome, PipelineSimulator};
pub use sink::RecordingSink;
pub use status::MemoryStatusChannel;
