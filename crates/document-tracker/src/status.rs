//! Live processing-status subscription.

use std::collections::HashSet;
use std::sync::Arc;

use assistant_core::{BackendError, ProcessingStatus, RecordBatch, StatusChannel, Subscription};
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Listens to a [`StatusChannel`] and delivers a user's full status set on
/// every server-side change.
pub struct StatusListener<S: StatusChannel + ?Sized> {
    channel: Arc<S>,
}

impl<S: StatusChannel + ?Sized> Clone for StatusListener<S> {
    fn clone(&self) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
        }
    }
}

impl<S: StatusChannel + ?Sized + 'static> StatusListener<S> {
    /// Create a listener on `channel`.
    pub fn new(channel: Arc<S>) -> Self {
        Self { channel }
    }

    /// Subscribe to a user's statuses.
    ///
    /// Every item is the complete current set, newest first, with at most
    /// one record per file. A subscription error yields an empty set, and so
    /// does the end of the backend stream, so nothing stale outlives it. An
    /// empty `user_id` yields a single empty set.
    pub fn subscribe(&self, user_id: &str) -> BoxStream<'static, Vec<ProcessingStatus>> {
        if user_id.is_empty() {
            debug!("No user, status listener not subscribed");
            return stream::once(async { Vec::new() }).boxed();
        }

        let user_id = user_id.to_string();
        info!(user_id = %user_id, "Subscribing to processing status");

        self.channel
            .subscribe(&user_id)
            .chain(stream::once(async { Err(BackendError::Closed) }))
            .map(move |delivery| match delivery {
                Ok(records) => normalize_statuses(&user_id, records),
                Err(e) => {
                    error!(user_id = %user_id, "Status subscription error, clearing known statuses: {}", e);
                    Vec::new()
                }
            })
            .boxed()
    }

    /// Forward every delivery to `tx` until cancelled or the stream ends.
    pub fn watch(&self, user_id: &str, tx: mpsc::Sender<Vec<ProcessingStatus>>) -> Subscription {
        let mut deliveries = self.subscribe(user_id);
        let user_id = user_id.to_string();

        let task = tokio::spawn(async move {
            while let Some(statuses) = deliveries.next().await {
                debug!(user_id = %user_id, count = statuses.len(), "Status delivery");
                if tx.send(statuses).await.is_err() {
                    debug!(user_id = %user_id, "Status receiver dropped, stopping listener");
                    return;
                }
            }
            if !user_id.is_empty() {
                warn!(user_id = %user_id, "Status stream ended");
            }
        });

        Subscription::for_task("status-listener", &task)
    }

    /// Subscribe and return a receiver of deliveries.
    pub fn watch_channel(
        &self,
        user_id: &str,
        capacity: usize,
    ) -> (mpsc::Receiver<Vec<ProcessingStatus>>, Subscription) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let subscription = self.watch(user_id, tx);
        (rx, subscription)
    }
}

/// Decode one delivery into a consistent status set.
///
/// Records that fail to decode or belong to another user are dropped. The
/// result is ordered by `updated_at` descending (undated records last) and
/// keeps only the most recent record per file.
pub fn normalize_statuses(user_id: &str, records: RecordBatch) -> Vec<ProcessingStatus> {
    let mut statuses: Vec<ProcessingStatus> = records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<ProcessingStatus>(record) {
            Ok(status) if status.user_id == user_id => Some(status),
            Ok(status) => {
                warn!(expected = user_id, got = %status.user_id, file_name = %status.file_name, "Dropping status for another user");
                None
            }
            Err(e) => {
                warn!(user_id, "Skipping undecodable status record: {}", e);
                None
            }
        })
        .collect();

    // Option orders None first, so descending puts undated records last
    statuses.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let mut seen = HashSet::new();
    statuses.retain(|status| seen.insert(status.file_name.clone()));
    statuses
}
