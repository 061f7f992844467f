//! Single-flight chat submission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use assistant_core::{ChatFunction, ChatRequest, Notification, NotificationSink};
use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, error, info};

use crate::config::GateConfig;
use crate::error::SubmitError;

/// Title of the notification shown when a submission fails.
pub const ERROR_TITLE: &str = "Chat Error";

/// Why a submission was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The prompt was empty or whitespace only.
    EmptyPrompt,
    /// An earlier submission is still outstanding.
    InFlight,
}

/// Result of one [`SubmissionGate::submit`].
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The chat function accepted the prompt. The persisted messages arrive
    /// through the feed.
    Sent { correlation_id: String },
    /// Nothing was sent.
    Skipped { reason: SkipReason },
    /// The call was made and failed. The user has been notified.
    Failed {
        correlation_id: String,
        error: SubmitError,
    },
}

impl SubmitOutcome {
    /// Whether the prompt reached the chat function successfully.
    pub fn is_sent(&self) -> bool {
        matches!(self, SubmitOutcome::Sent { .. })
    }

    /// The correlation id of the call, if one was made.
    pub fn correlation_id(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Sent { correlation_id } | SubmitOutcome::Failed { correlation_id, .. } => {
                Some(correlation_id.as_str())
            }
            SubmitOutcome::Skipped { .. } => None,
        }
    }
}

/// Clears the in-flight flag when dropped, whatever path the call took.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sends prompts for one session, one at a time.
///
/// The gate never touches message state. Whatever the backend persists is
/// observed through the message feed.
pub struct SubmissionGate<C: ChatFunction + ?Sized> {
    chat: Arc<C>,
    sink: Arc<dyn NotificationSink>,
    session_id: String,
    config: GateConfig,
    in_flight: AtomicBool,
}

impl<C: ChatFunction + ?Sized> SubmissionGate<C> {
    /// Create a gate for `session_id`.
    pub fn new(
        chat: Arc<C>,
        sink: Arc<dyn NotificationSink>,
        session_id: impl Into<String>,
        config: GateConfig,
    ) -> Self {
        Self {
            chat,
            sink,
            session_id: session_id.into(),
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    /// The session this gate submits to.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether a submission is outstanding.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit a prompt.
    ///
    /// Empty input and input arriving while a call is outstanding are
    /// ignored. Failures are reported to the notification sink and returned
    /// as [`SubmitOutcome::Failed`].
    pub async fn submit(&self, prompt: &str) -> SubmitOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            debug!(session_id = %self.session_id, "Ignoring empty prompt");
            return SubmitOutcome::Skipped {
                reason: SkipReason::EmptyPrompt,
            };
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(session_id = %self.session_id, "Submission already in flight, ignoring");
            return SubmitOutcome::Skipped {
                reason: SkipReason::InFlight,
            };
        }
        let _guard = InFlightGuard(&self.in_flight);

        // Advisory only, collisions are acceptable
        let correlation_id = Utc::now().timestamp_millis().to_string();
        let request = ChatRequest::new(prompt, self.session_id.as_str(), correlation_id.as_str());

        info!(
            session_id = %self.session_id,
            correlation_id = %correlation_id,
            chat = self.chat.name(),
            "Submitting prompt"
        );

        match self.call(request).await {
            Ok(()) => {
                debug!(session_id = %self.session_id, correlation_id = %correlation_id, "Chat call succeeded");
                SubmitOutcome::Sent { correlation_id }
            }
            Err(e) => {
                error!(session_id = %self.session_id, correlation_id = %correlation_id, "Error sending message: {}", e);
                self.sink
                    .notify(Notification::error(e.user_message()).with_title(ERROR_TITLE));
                SubmitOutcome::Failed {
                    correlation_id,
                    error: e,
                }
            }
        }
    }

    async fn call(&self, request: ChatRequest) -> Result<(), SubmitError> {
        let response = timeout(self.config.chat_timeout, self.chat.call(request))
            .await
            .map_err(|_| SubmitError::Timeout(self.config.chat_timeout))??;

        if response.is_success() {
            Ok(())
        } else {
            Err(SubmitError::Rejected(response.message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use assistant_core::Level;
    use mock_backend::{DelayedChat, EchoChat, FailingChat, FailingMode, RecordingSink};

    fn make_gate<C: ChatFunction>(chat: C) -> (SubmissionGate<C>, Arc<C>, Arc<RecordingSink>) {
        let chat = Arc::new(chat);
        let sink = Arc::new(RecordingSink::new());
        let gate = SubmissionGate::new(
            Arc::clone(&chat),
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
            "001",
            GateConfig::default(),
        );
        (gate, chat, sink)
    }

    #[tokio::test]
    async fn test_submit_trims_and_sends() {
        let (gate, chat, sink) = make_gate(EchoChat::new());

        let outcome = gate.submit("  hello there \n").await;

        assert!(outcome.is_sent());
        let requests = chat.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "hello there");
        assert_eq!(requests[0].session_id, "001");
        assert_eq!(Some(requests[0].correlation_id.as_str()), outcome.correlation_id());
        assert!(requests[0].correlation_id.parse::<i64>().is_ok());
        assert!(sink.is_empty());
        assert!(!gate.is_in_flight());
    }

    #[tokio::test]
    async fn test_empty_prompt_is_skipped() {
        let (gate, chat, sink) = make_gate(EchoChat::new());

        for prompt in ["", "   ", "\n\t"] {
            let outcome = gate.submit(prompt).await;
            assert!(matches!(
                outcome,
                SubmitOutcome::Skipped {
                    reason: SkipReason::EmptyPrompt
                }
            ));
        }

        assert_eq!(chat.calls(), 0);
        assert!(sink.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_submissions_make_one_call() {
        let (gate, chat, _sink) = make_gate(DelayedChat::new(EchoChat::new(), Duration::from_secs(2)));

        let (first, second) = tokio::join!(gate.submit("one"), gate.submit("two"));

        assert!(first.is_sent());
        assert!(matches!(
            second,
            SubmitOutcome::Skipped {
                reason: SkipReason::InFlight
            }
        ));
        assert_eq!(chat.inner().calls(), 1);

        // Released once the first call resolved
        assert!(gate.submit("three").await.is_sent());
        assert_eq!(chat.inner().calls(), 2);
    }

    #[tokio::test]
    async fn test_unsuccessful_response_notifies_server_message() {
        let (gate, _chat, sink) = make_gate(FailingChat::unsuccessful("Prompt too long"));

        let outcome = gate.submit("hi").await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Failed {
                error: SubmitError::Rejected(_),
                ..
            }
        ));
        let notifications = sink.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, Level::Error);
        assert_eq!(notifications[0].title.as_deref(), Some("Chat Error"));
        assert_eq!(notifications[0].text, "Prompt too long");
        assert!(!gate.is_in_flight());
    }

    #[tokio::test]
    async fn test_missing_data_uses_default_text() {
        let (gate, _chat, sink) = make_gate(FailingChat::new(FailingMode::MissingData));

        let outcome = gate.submit("hi").await;

        assert!(!outcome.is_sent());
        assert_eq!(
            sink.texts(),
            vec!["Sorry, I encountered an error. Please try again."]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_releases_gate() {
        let (gate, chat, sink) = make_gate(FailingChat::transport("connection reset"));

        let outcome = gate.submit("hi").await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Failed {
                error: SubmitError::Backend(_),
                ..
            }
        ));
        assert_eq!(
            sink.texts(),
            vec!["Sorry, I encountered an error. Please try again."]
        );

        // A failed call does not leave the gate stuck
        gate.submit("again").await;
        assert_eq!(chat.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_and_releases() {
        let chat = Arc::new(DelayedChat::new(EchoChat::new(), Duration::from_secs(120)));
        let sink = Arc::new(RecordingSink::new());
        let gate = SubmissionGate::new(
            Arc::clone(&chat),
            Arc::clone(&sink) as Arc<dyn NotificationSink>,
            "001",
            GateConfig::with_timeout(Duration::from_secs(60)),
        );

        let outcome = gate.submit("hi").await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Failed {
                error: SubmitError::Timeout(_),
                ..
            }
        ));
        assert_eq!(sink.len(), 1);
        assert!(!gate.is_in_flight());
    }
}
