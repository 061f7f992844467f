//! One chat session: its message feed and its submission gate.

use std::sync::Arc;

use assistant_core::{ChatFunction, Message, MessageStore, NotificationSink, Subscription};
use tokio::sync::watch;
use tracing::info;

use crate::config::ChatSessionConfig;
use crate::gate::{SubmissionGate, SubmitOutcome};
use crate::listener::MessageFeedListener;

/// A running chat session.
///
/// The message list is only ever replaced by the feed. Submissions do not
/// add optimistic entries.
pub struct ChatSession<C: ChatFunction + ?Sized> {
    session_id: String,
    messages: watch::Receiver<Vec<Message>>,
    gate: SubmissionGate<C>,
    subscription: Subscription,
}

impl<C: ChatFunction + ?Sized> ChatSession<C> {
    /// Subscribe to the session's messages and prepare its gate.
    pub fn start<M>(
        store: Arc<M>,
        chat: Arc<C>,
        sink: Arc<dyn NotificationSink>,
        config: ChatSessionConfig,
    ) -> Self
    where
        M: MessageStore + ?Sized + 'static,
    {
        let listener = MessageFeedListener::new(store);
        let (messages, subscription) = listener.watch_channel(&config.session_id);
        let gate = SubmissionGate::new(chat, sink, config.session_id.as_str(), config.gate);

        info!(session_id = %config.session_id, "Chat session started");

        Self {
            session_id: config.session_id,
            messages,
            gate,
            subscription,
        }
    }

    /// The session id.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// A receiver that observes every delivered message list.
    pub fn messages(&self) -> watch::Receiver<Vec<Message>> {
        self.messages.clone()
    }

    /// The most recently delivered message list.
    pub fn current(&self) -> Vec<Message> {
        self.messages.borrow().clone()
    }

    /// Submit a prompt through the session's gate.
    pub async fn submit(&self, prompt: &str) -> SubmitOutcome {
        self.gate.submit(prompt).await
    }

    /// Whether a submission is outstanding.
    pub fn is_submitting(&self) -> bool {
        self.gate.is_in_flight()
    }

    /// Stop the message feed. Safe to call more than once.
    pub fn cancel(&self) {
        if !self.subscription.is_cancelled() {
            info!(session_id = %self.session_id, "Chat session cancelled");
        }
        self.subscription.cancel();
    }

    /// Whether the feed was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.subscription.is_cancelled()
    }
}
