//! User-visible notifications.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Success,
    Error,
}

/// A dismissable notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub title: Option<String>,
    pub text: String,
}

impl Notification {
    /// Create an informational notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Level::Info, text)
    }

    /// Create a success notice.
    pub fn success(text: impl Into<String>) -> Self {
        Self::new(Level::Success, text)
    }

    /// Create an error notice.
    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Level::Error, text)
    }

    fn new(level: Level, text: impl Into<String>) -> Self {
        Self {
            level,
            title: None,
            text: text.into(),
        }
    }

    /// Builder method to set a title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Destination for notifications (a toast area, a log, a test recorder).
pub trait NotificationSink: Send + Sync {
    /// Deliver one notification. Must not block.
    fn notify(&self, notification: Notification);
}

impl<T: NotificationSink + ?Sized> NotificationSink for Arc<T> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

impl NotificationSink for mpsc::UnboundedSender<Notification> {
    fn notify(&self, notification: Notification) {
        if self.send(notification).is_err() {
            debug!("Notification receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let n = Notification::error("Sorry").with_title("Chat Error");
        assert_eq!(n.level, Level::Error);
        assert_eq!(n.title.as_deref(), Some("Chat Error"));
        assert_eq!(n.text, "Sorry");
    }

    #[tokio::test]
    async fn test_channel_sink() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink: Arc<dyn NotificationSink> = Arc::new(tx);

        sink.notify(Notification::success("a.pdf is ready for chat!"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.level, Level::Success);
    }

    #[test]
    fn test_closed_channel_is_ignored() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.notify(Notification::info("nobody listening"));
    }
}
