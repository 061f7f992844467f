//! Configuration for chat sessions and the submission gate.

use std::time::Duration;

/// Default upper bound on one remote chat call (60 seconds).
pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Session used when none is configured.
pub const DEFAULT_SESSION_ID: &str = "001";

/// Configuration for a [`SubmissionGate`](crate::SubmissionGate).
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// How long to wait for the chat function before giving up.
    pub chat_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }
}

impl GateConfig {
    /// Create a config with a custom timeout.
    pub fn with_timeout(chat_timeout: Duration) -> Self {
        Self { chat_timeout }
    }
}

/// Configuration for a [`ChatSession`](crate::ChatSession).
#[derive(Debug, Clone)]
pub struct ChatSessionConfig {
    pub session_id: String,
    pub gate: GateConfig,
}

impl Default for ChatSessionConfig {
    fn default() -> Self {
        Self {
            session_id: DEFAULT_SESSION_ID.to_string(),
            gate: GateConfig::default(),
        }
    }
}

impl ChatSessionConfig {
    /// Create a config for the given session.
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the chat timeout.
    pub fn chat_timeout(mut self, timeout: Duration) -> Self {
        self.gate.chat_timeout = timeout;
        self
    }
}
