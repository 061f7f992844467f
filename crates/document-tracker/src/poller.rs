//! Periodic listing of a user's stored files.

use std::sync::Arc;
use std::time::Duration;

use assistant_core::{user_scope, BlobStore, FileRecord, Subscription};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_POLL_INTERVAL;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Polls a [`BlobStore`] and produces full snapshots of a user's files.
///
/// Every cycle re-enumerates the whole scope; nothing is diffed.
pub struct ListingPoller<B: BlobStore + ?Sized> {
    store: Arc<B>,
    poll_interval: Duration,
}

impl<B: BlobStore + ?Sized> Clone for ListingPoller<B> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            poll_interval: self.poll_interval,
        }
    }
}

impl<B: BlobStore + ?Sized + 'static> ListingPoller<B> {
    /// Create a poller with the default 5 second interval.
    pub fn new(store: Arc<B>) -> Self {
        Self {
            store,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        if poll_interval < MIN_POLL_INTERVAL {
            warn!(?poll_interval, "Poll interval too small, using {:?}", MIN_POLL_INTERVAL);
        }
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// The configured poll interval.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run one listing cycle.
    ///
    /// A failed listing yields an empty snapshot. A file whose metadata
    /// cannot be read is left out of this snapshot only.
    pub async fn poll_once(&self, user_id: &str) -> Vec<FileRecord> {
        let scope = user_scope(user_id);

        let items = match self.store.list(&scope).await {
            Ok(items) => items,
            Err(e) => {
                error!(user_id, "Error listing documents: {}", e);
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for item in &items {
            match self.store.metadata(item).await {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(file_name = %item.name, "Error getting metadata, skipping this cycle: {}", e);
                }
            }
        }

        debug!(user_id, listed = items.len(), kept = records.len(), "Listing cycle done");
        records
    }

    /// Poll on a timer and send each snapshot to `tx` until cancelled.
    ///
    /// The first cycle runs immediately. An empty `user_id` sends one empty
    /// snapshot and starts no timer. A snapshot that is already in flight
    /// when the subscription is cancelled may still be delivered.
    pub fn watch(&self, user_id: &str, tx: mpsc::Sender<Vec<FileRecord>>) -> Subscription {
        if user_id.is_empty() {
            debug!("No user, listing poller not started");
            if tx.try_send(Vec::new()).is_err() {
                debug!("Snapshot receiver unavailable");
            }
            return Subscription::inert("listing-poller");
        }

        let poller = self.clone();
        let user_id = user_id.to_string();

        let task = tokio::spawn(async move {
            let mut ticker = interval(poller.poll_interval);
            info!(user_id = %user_id, poll_interval = ?poller.poll_interval, "Starting listing poller");

            loop {
                ticker.tick().await;

                let snapshot = poller.poll_once(&user_id).await;
                if tx.send(snapshot).await.is_err() {
                    debug!(user_id = %user_id, "Snapshot receiver dropped, stopping listing poller");
                    break;
                }
            }
        });

        Subscription::for_task("listing-poller", &task)
    }

    /// Poll on a timer and return a receiver of snapshots.
    pub fn watch_channel(
        &self,
        user_id: &str,
        capacity: usize,
    ) -> (mpsc::Receiver<Vec<FileRecord>>, Subscription) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let subscription = self.watch(user_id, tx);
        (rx, subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mock_backend::MemoryBlobStore;

    fn store_with(names: &[&str]) -> Arc<MemoryBlobStore> {
        let store = Arc::new(MemoryBlobStore::new());
        for (i, name) in names.iter().enumerate() {
            store.put("u1", FileRecord::new(*name, (i as u64 + 1) * 100, Utc::now()));
        }
        store
    }

    #[tokio::test]
    async fn test_poll_once_lists_all_files() {
        let poller = ListingPoller::new(store_with(&["a.pdf", "b.pdf"]));

        let snapshot = poller.poll_once("u1").await;

        let names: Vec<_> = snapshot.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_metadata_failure_skips_only_that_file() {
        let store = store_with(&["a.pdf", "b.pdf"]);
        store.set_metadata_failure("a.pdf", true);
        let poller = ListingPoller::new(Arc::clone(&store));

        let snapshot = poller.poll_once("u1").await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].file_name, "b.pdf");

        // Retried on the next cycle
        store.set_metadata_failure("a.pdf", false);
        assert_eq!(poller.poll_once("u1").await.len(), 2);
    }

    #[tokio::test]
    async fn test_listing_failure_yields_empty_snapshot() {
        let store = store_with(&["a.pdf"]);
        store.set_listing_failure(true);
        let poller = ListingPoller::new(store);

        assert!(poller.poll_once("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_user_yields_empty_snapshot_without_timer() {
        let store = store_with(&["a.pdf"]);
        let poller = ListingPoller::new(Arc::clone(&store));

        let (mut rx, sub) = poller.watch_channel("", 4);

        assert_eq!(rx.recv().await, Some(Vec::new()));
        // Sender dropped, nothing else will arrive
        assert_eq!(rx.recv().await, None);
        assert_eq!(store.list_calls(), 0);
        sub.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval() {
        let store = store_with(&["a.pdf"]);
        let poller = ListingPoller::new(Arc::clone(&store)).with_poll_interval(Duration::from_secs(5));

        let (mut rx, sub) = poller.watch_channel("u1", 4);

        // First cycle is immediate
        assert_eq!(rx.recv().await.unwrap().len(), 1);

        store.put("u1", FileRecord::new("b.pdf", 5, Utc::now()));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(store.list_calls(), 2);

        sub.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let store = store_with(&["a.pdf"]);
        let poller = ListingPoller::new(Arc::clone(&store)).with_poll_interval(Duration::from_secs(5));

        let (mut rx, sub) = poller.watch_channel("u1", 4);
        assert!(rx.recv().await.is_some());

        sub.cancel();
        sub.cancel();

        // The task is gone, so the sender is dropped and the channel drains
        assert_eq!(rx.recv().await, None);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.list_calls(), 1);
    }
}
