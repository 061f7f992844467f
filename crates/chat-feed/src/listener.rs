//! Live message feed for one chat session.

use std::collections::HashSet;
use std::sync::Arc;

use assistant_core::{Message, MessageStore, RecordBatch, Subscription};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Listens to a [`MessageStore`] and delivers a session's complete ordered
/// message list on every change.
pub struct MessageFeedListener<M: MessageStore + ?Sized> {
    store: Arc<M>,
}

impl<M: MessageStore + ?Sized> Clone for MessageFeedListener<M> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<M: MessageStore + ?Sized + 'static> MessageFeedListener<M> {
    /// Create a listener on `store`.
    pub fn new(store: Arc<M>) -> Self {
        Self { store }
    }

    /// Subscribe to a session's messages.
    ///
    /// Every item is the whole list, oldest first, without duplicate ids. A
    /// subscription error yields an empty list. An empty `session_id` yields
    /// a single empty list.
    pub fn subscribe(&self, session_id: &str) -> BoxStream<'static, Vec<Message>> {
        if session_id.is_empty() {
            debug!("No session, message feed not subscribed");
            return stream::once(async { Vec::new() }).boxed();
        }

        let session_id = session_id.to_string();
        info!(session_id = %session_id, "Subscribing to session messages");

        self.store
            .subscribe(&session_id)
            .map(move |delivery| match delivery {
                Ok(records) => normalize_messages(&session_id, records),
                Err(e) => {
                    error!(session_id = %session_id, "Message subscription error, clearing feed: {}", e);
                    Vec::new()
                }
            })
            .boxed()
    }

    /// Publish every delivery into `tx` until cancelled or the stream ends.
    pub fn watch(&self, session_id: &str, tx: watch::Sender<Vec<Message>>) -> Subscription {
        let mut deliveries = self.subscribe(session_id);
        let session_id = session_id.to_string();

        let task = tokio::spawn(async move {
            while let Some(messages) = deliveries.next().await {
                debug!(session_id = %session_id, count = messages.len(), "Message delivery");
                tx.send_replace(messages);
            }
            if !session_id.is_empty() {
                warn!(session_id = %session_id, "Message stream ended");
            }
        });

        Subscription::for_task("message-feed", &task)
    }

    /// Subscribe and return a receiver holding the latest list.
    pub fn watch_channel(&self, session_id: &str) -> (watch::Receiver<Vec<Message>>, Subscription) {
        let (tx, rx) = watch::channel(Vec::new());
        let subscription = self.watch(session_id, tx);
        (rx, subscription)
    }
}

/// Decode one delivery into an ordered message list.
///
/// Undecodable records are dropped. The result is sorted by `created_at`
/// ascending, keeping write order for equal timestamps, and the first
/// occurrence of each id wins.
pub fn normalize_messages(session_id: &str, records: RecordBatch) -> Vec<Message> {
    let mut messages: Vec<Message> = records
        .into_iter()
        .filter_map(|record| match Message::from_record(record) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(session_id, "Skipping undecodable message record: {}", e);
                None
            }
        })
        .collect();

    let mut seen = HashSet::new();
    messages.retain(|message| seen.insert(message.id.clone()));

    // Stable, so equal timestamps keep their delivery order
    messages.sort_by_key(|message| message.created_at);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use assistant_core::{MessageBody, Role};
    use chrono::{TimeZone, Utc};
    use mock_backend::MemoryMessageStore;
    use serde_json::json;

    fn at(secs: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_normalize_sorts_ascending() {
        let list = normalize_messages(
            "001",
            vec![
                Message::user("m2", "second", at(2)).to_record(),
                Message::user("m1", "first", at(1)).to_record(),
                Message::user("m3", "third", at(3)).to_record(),
            ],
        );

        let ids: Vec<_> = list.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_normalize_equal_timestamps_keep_write_order() {
        let list = normalize_messages(
            "001",
            vec![
                Message::user("b", "x", at(1)).to_record(),
                Message::user("a", "y", at(1)).to_record(),
            ],
        );

        assert_eq!(list[0].id, "b");
        assert_eq!(list[1].id, "a");
    }

    #[test]
    fn test_normalize_drops_duplicate_ids() {
        let list = normalize_messages(
            "001",
            vec![
                Message::user("m1", "original", at(1)).to_record(),
                Message::user("m1", "copy", at(0)).to_record(),
            ],
        );

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].text(), "original");
    }

    #[test]
    fn test_normalize_selects_shape_by_role() {
        let list = normalize_messages(
            "001",
            vec![
                json!({
                    "id": "u",
                    "role": "user",
                    "content": "What is in the report?",
                    "createdAt": at(1).to_rfc3339(),
                    "clientMessageId": "1700000001000",
                }),
                json!({
                    "id": "a",
                    "role": "assistant",
                    "content": [
                        {"type": "tool_call", "name": "search_documents", "arguments": {"q": "report"}},
                        {"type": "tool_output", "output": "3 hits"},
                        {"type": "output_text", "text": "The report covers Q3."}
                    ],
                    "createdAt": at(2).to_rfc3339(),
                }),
                json!({"id": "bad", "role": "system", "content": "x", "createdAt": at(3).to_rfc3339()}),
                json!({"id": "no-role", "content": "x"}),
            ],
        );

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].role(), Role::User);
        assert_eq!(list[0].client_message_id.as_deref(), Some("1700000001000"));
        assert_eq!(list[1].role(), Role::Assistant);
        match &list[1].body {
            MessageBody::Assistant { items } => assert_eq!(items.len(), 3),
            other => panic!("unexpected body: {:?}", other),
        }
        assert_eq!(list[1].text(), "The report covers Q3.");
    }

    #[tokio::test]
    async fn test_feed_delivers_full_list_on_every_write() {
        let store = Arc::new(MemoryMessageStore::new());
        let listener = MessageFeedListener::new(Arc::clone(&store));

        let mut feed = listener.subscribe("001");
        assert!(feed.next().await.unwrap().is_empty());

        store.append("001", &Message::user("m2", "later", at(5)));
        assert_eq!(feed.next().await.unwrap().len(), 1);

        store.append("001", &Message::user("m1", "earlier", at(1)));
        let list = feed.next().await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "m1");
    }

    #[tokio::test]
    async fn test_error_delivers_empty_list() {
        let store = Arc::new(MemoryMessageStore::new());
        store.append("001", &Message::user("m1", "hi", at(1)));
        let listener = MessageFeedListener::new(Arc::clone(&store));

        let mut feed = listener.subscribe("001");
        assert_eq!(feed.next().await.unwrap().len(), 1);

        store.fail("001", "permission denied");
        assert!(feed.next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_tears_down_subscription() {
        let store = Arc::new(MemoryMessageStore::new());
        let listener = MessageFeedListener::new(Arc::clone(&store));

        let (mut rx, sub) = listener.watch_channel("001");
        rx.changed().await.unwrap();
        assert_eq!(store.subscriber_count("001"), 1);

        sub.cancel();
        sub.cancel();
        assert!(rx.changed().await.is_err());
        assert_eq!(store.subscriber_count("001"), 0);
    }

    #[tokio::test]
    async fn test_empty_session_delivers_single_empty_list() {
        let store = Arc::new(MemoryMessageStore::new());
        let listener = MessageFeedListener::new(Arc::clone(&store));

        let mut feed = listener.subscribe("");
        assert_eq!(feed.next().await, Some(Vec::new()));
        assert_eq!(feed.next().await, None);
        assert_eq!(store.subscriber_count(""), 0);
    }
}
