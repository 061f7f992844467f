//! In-memory chat message store.

use std::collections::HashMap;
use std::sync::Mutex;

use assistant_core::{Message, MessageStore, RecordStream};
use serde_json::Value;

use crate::fanout::{lock, Fanout};

/// Message store that pushes each session's full message list on every write.
///
/// Records are delivered in write order. Ordering by `createdAt` is left to
/// the consumer so that out-of-order writes can be exercised.
#[derive(Default)]
pub struct MemoryMessageStore {
    sessions: Mutex<HashMap<String, Vec<Value>>>,
    fanout: Fanout,
}

impl MemoryMessageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to a session and push the full list.
    pub fn append(&self, session_id: &str, message: &Message) {
        self.append_raw(session_id, message.to_record());
    }

    /// Append a raw record to a session and push the full list.
    pub fn append_raw(&self, session_id: &str, record: Value) {
        let mut sessions = lock(&self.sessions);
        let list = sessions.entry(session_id.to_string()).or_default();
        list.push(record);
        self.fanout.publish(session_id, list);
    }

    /// Push a subscription error to every subscriber of `session_id`.
    pub fn fail(&self, session_id: &str, message: &str) {
        let _sessions = lock(&self.sessions);
        self.fanout.fail(session_id, message);
    }

    /// End every subscription of `session_id`.
    pub fn close(&self, session_id: &str) {
        self.fanout.close(session_id);
    }

    /// Number of records written to `session_id`.
    pub fn len(&self, session_id: &str) -> usize {
        lock(&self.sessions).get(session_id).map_or(0, Vec::len)
    }

    /// Whether `session_id` has no records.
    pub fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id) == 0
    }

    /// Number of live subscriptions for `session_id`.
    pub fn subscriber_count(&self, session_id: &str) -> usize {
        self.fanout.active(session_id)
    }
}

impl MessageStore for MemoryMessageStore {
    fn subscribe(&self, session_id: &str) -> RecordStream {
        let sessions = lock(&self.sessions);
        let initial = sessions.get(session_id).cloned().unwrap_or_default();
        self.fanout.subscribe(session_id, initial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_every_write_pushes_full_list() {
        let store = MemoryMessageStore::new();
        let mut stream = store.subscribe("001");
        assert!(stream.next().await.unwrap().unwrap().is_empty());

        store.append("001", &Message::user("m1", "one", Utc::now()));
        store.append("001", &Message::user("m2", "two", Utc::now()));

        assert_eq!(stream.next().await.unwrap().unwrap().len(), 1);
        assert_eq!(stream.next().await.unwrap().unwrap().len(), 2);
        assert_eq!(store.len("001"), 2);
    }
}
