//! Remote chat stand-ins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assistant_core::{
    AssistantItem, BackendError, ChatFunction, ChatRequest, ChatResponse, Message,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::time::sleep;

use crate::fanout::lock;
use crate::messages::MemoryMessageStore;

/// A chat function that answers with the prompt echoed back.
///
/// When given a message store it also persists the exchange (user prompt
/// then assistant reply), the way the real backend does.
#[derive(Default)]
pub struct EchoChat {
    store: Option<Arc<MemoryMessageStore>>,
    requests: Mutex<Vec<ChatRequest>>,
    next_id: AtomicU64,
}

impl EchoChat {
    /// Create an echo chat that persists nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an echo chat that writes each exchange to `store`.
    pub fn persisting_to(store: Arc<MemoryMessageStore>) -> Self {
        Self {
            store: Some(store),
            ..Default::default()
        }
    }

    /// Number of calls received.
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl ChatFunction for EchoChat {
    async fn call(&self, request: ChatRequest) -> Result<ChatResponse, BackendError> {
        lock(&self.requests).push(request.clone());
        let answer = format!("Echo: {}", request.prompt);

        if let Some(store) = &self.store {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            let asked_at = Utc::now();
            let answered_at = asked_at + chrono::Duration::milliseconds(1);

            store.append(
                &request.session_id,
                &Message::user(format!("{}-user", n), &request.prompt, asked_at)
                    .with_client_id(&request.correlation_id),
            );
            store.append(
                &request.session_id,
                &Message::assistant(
                    format!("{}-assistant", n),
                    vec![AssistantItem::OutputText {
                        text: answer.clone(),
                    }],
                    answered_at,
                ),
            );
        }

        Ok(ChatResponse::ok(answer))
    }

    fn name(&self) -> &str {
        "EchoChat"
    }
}

/// How a [`FailingChat`] fails.
#[derive(Debug, Clone)]
pub enum FailingMode {
    /// Respond with `success = false` and this message.
    Unsuccessful(String),
    /// Respond with `success = true` but no data.
    MissingData,
    /// Fail the call itself.
    Transport(String),
}

/// A chat function that always fails.
#[derive(Debug)]
pub struct FailingChat {
    mode: FailingMode,
    calls: AtomicU64,
}

impl FailingChat {
    /// Create a chat that fails in the given way.
    pub fn new(mode: FailingMode) -> Self {
        Self {
            mode,
            calls: AtomicU64::new(0),
        }
    }

    /// Respond unsuccessfully with `message`.
    pub fn unsuccessful(message: impl Into<String>) -> Self {
        Self::new(FailingMode::Unsuccessful(message.into()))
    }

    /// Fail at the transport level with `message`.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FailingMode::Transport(message.into()))
    }

    /// Number of calls received.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatFunction for FailingChat {
    async fn call(&self, _request: ChatRequest) -> Result<ChatResponse, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            FailingMode::Unsuccessful(message) => Ok(ChatResponse::failed(message.clone())),
            FailingMode::MissingData => Ok(ChatResponse {
                success: true,
                message: String::new(),
                data: None,
            }),
            FailingMode::Transport(message) => Err(BackendError::Transport(message.clone())),
        }
    }

    fn name(&self) -> &str {
        "FailingChat"
    }
}

/// A chat function that wraps another and adds artificial delay.
///
/// Useful for exercising in-flight submissions and timeouts.
pub struct DelayedChat<C: ChatFunction> {
    inner: C,
    delay: Duration,
}

impl<C: ChatFunction> DelayedChat<C> {
    /// Wrap `inner` with the given delay.
    pub fn new(inner: C, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Wrap `inner` with a delay in milliseconds.
    pub fn with_millis(inner: C, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// The wrapped chat function.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: ChatFunction> ChatFunction for DelayedChat<C> {
    async fn call(&self, request: ChatRequest) -> Result<ChatResponse, BackendError> {
        sleep(self.delay).await;
        self.inner.call(request).await
    }

    fn name(&self) -> &str {
        "DelayedChat"
    }
}
