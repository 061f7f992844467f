//! Notification sink that records everything it receives.

use std::sync::Mutex;

use assistant_core::{Notification, NotificationSink};

use crate::fanout::lock;

/// Collects notifications for later inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far.
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.received).clone()
    }

    /// Texts of everything received so far.
    pub fn texts(&self) -> Vec<String> {
        lock(&self.received).iter().map(|n| n.text.clone()).collect()
    }

    /// Number of notifications received.
    pub fn len(&self) -> usize {
        lock(&self.received).len()
    }

    /// Whether nothing was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        lock(&self.received).push(notification);
    }
}
