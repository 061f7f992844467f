//! In-memory processing-status channel.

use std::collections::HashMap;
use std::sync::Mutex;

use assistant_core::{ProcessingStatus, RecordBatch, RecordStream, StatusChannel};
use chrono::Utc;
use tracing::warn;

use crate::fanout::{lock, Fanout};

/// Status channel that pushes each user's full status set on every change.
///
/// New subscribers immediately receive the current set (possibly empty).
#[derive(Default)]
pub struct MemoryStatusChannel {
    statuses: Mutex<HashMap<String, Vec<ProcessingStatus>>>,
    fanout: Fanout,
}

impl MemoryStatusChannel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the status of one file and push the full set.
    ///
    /// A missing `updated_at` is stamped with the current time.
    pub fn upsert(&self, mut status: ProcessingStatus) {
        if status.updated_at.is_none() {
            status.updated_at = Some(Utc::now());
        }

        let mut statuses = lock(&self.statuses);
        let user = statuses.entry(status.user_id.clone()).or_default();
        user.retain(|s| s.file_name != status.file_name);
        let user_id = status.user_id.clone();
        user.push(status);

        let batch = to_batch(user);
        self.fanout.publish(&user_id, &batch);
    }

    /// Delete one file's status (e.g. after expiry) and push the full set.
    pub fn remove(&self, user_id: &str, file_name: &str) {
        let mut statuses = lock(&self.statuses);
        let user = statuses.entry(user_id.to_string()).or_default();
        user.retain(|s| s.file_name != file_name);
        let batch = to_batch(user);
        self.fanout.publish(user_id, &batch);
    }

    /// Push raw records without touching the stored state.
    pub fn push_raw(&self, user_id: &str, batch: RecordBatch) {
        let _statuses = lock(&self.statuses);
        self.fanout.publish(user_id, &batch);
    }

    /// Push a subscription error to every subscriber of `user_id`.
    pub fn fail(&self, user_id: &str, message: &str) {
        let _statuses = lock(&self.statuses);
        self.fanout.fail(user_id, message);
    }

    /// End every subscription of `user_id`.
    pub fn close(&self, user_id: &str) {
        self.fanout.close(user_id);
    }

    /// Number of live subscriptions for `user_id`.
    pub fn subscriber_count(&self, user_id: &str) -> usize {
        self.fanout.active(user_id)
    }

    /// The stored set for `user_id`.
    pub fn current(&self, user_id: &str) -> Vec<ProcessingStatus> {
        lock(&self.statuses).get(user_id).cloned().unwrap_or_default()
    }
}

impl StatusChannel for MemoryStatusChannel {
    fn subscribe(&self, user_id: &str) -> RecordStream {
        let statuses = lock(&self.statuses);
        let initial = statuses.get(user_id).map(|s| to_batch(s)).unwrap_or_default();
        self.fanout.subscribe(user_id, initial)
    }
}

/// Encode a status set ordered by `updated_at` descending.
fn to_batch(set: &[ProcessingStatus]) -> RecordBatch {
    let mut ordered: Vec<&ProcessingStatus> = set.iter().collect();
    ordered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    ordered
        .into_iter()
        .filter_map(|s| match serde_json::to_value(s) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(file_name = %s.file_name, "Failed to encode status: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assistant_core::Phase;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_subscribe_receives_current_then_updates() {
        let channel = MemoryStatusChannel::new();
        channel.upsert(ProcessingStatus::new("u1", "a.pdf", Phase::Uploading));

        let mut stream = channel.subscribe("u1");
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        channel.upsert(ProcessingStatus::new("u1", "a.pdf", Phase::Processing));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0]["status"], "processing");
    }

    #[tokio::test]
    async fn test_other_users_are_isolated() {
        let channel = MemoryStatusChannel::new();
        let mut stream = channel.subscribe("u1");
        assert!(stream.next().await.unwrap().unwrap().is_empty());

        channel.upsert(ProcessingStatus::new("u2", "b.pdf", Phase::Uploading));
        channel.fail("u1", "boom");

        assert!(stream.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let channel = MemoryStatusChannel::new();
        let mut stream = channel.subscribe("u1");
        let _ = stream.next().await;
        assert_eq!(channel.subscriber_count("u1"), 1);

        channel.close("u1");
        assert!(stream.next().await.is_none());
        assert_eq!(channel.subscriber_count("u1"), 0);
    }
}
