//! Chat feed and submission for the document assistant.
//!
//! - [`MessageFeedListener`] - delivers a session's full ordered message list on every change
//! - [`SubmissionGate`] - sends one prompt at a time and reports failures as notifications
//! - [`ChatSession`] - both of the above for one session id
//!
//! Submissions never edit the message list. The backend persists the user
//! prompt and the reply, and both show up through the feed.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use assistant_core::{ChatFunction, MessageStore, NotificationSink};
//! use chat_feed::{ChatSession, ChatSessionConfig};
//!
//! # async fn example(
//! #     store: Arc<dyn MessageStore>,
//! #     chat: Arc<dyn ChatFunction>,
//! #     sink: Arc<dyn NotificationSink>,
//! # ) {
//! let session = ChatSession::start(store, chat, sink, ChatSessionConfig::default());
//!
//! session.submit("What does the report say about Q3?").await;
//!
//! let mut messages = session.messages();
//! while messages.changed().await.is_ok() {
//!     for message in messages.borrow().iter() {
//!         println!("{}: {}", message.role().as_str(), message.text());
//!     }
//! }
//! # }
//! ```

mod config;
mod error;
mod gate;
mod listener;
mod session;

pub use config::{ChatSessionConfig, GateConfig, DEFAULT_CHAT_TIMEOUT, DEFAULT_SESSION_ID};
pub use error::{SubmitError, DEFAULT_ERROR_TEXT};
pub use gate::{SkipReason, SubmissionGate, SubmitOutcome, ERROR_TITLE};
pub use listener::{normalize_messages, MessageFeedListener};
pub use session::ChatSession;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
