//! Per-user document tracking: poller + status listener + reconciler.

use std::sync::Arc;

use assistant_core::{BlobStore, DocumentView, NotificationSink, StatusChannel, Subscription};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::poller::ListingPoller;
use crate::reconciler::Reconciler;
use crate::status::StatusListener;

/// Starts document tracking for users.
///
/// Each [`start`](Self::start) creates a fresh [`Reconciler`] owned by a
/// single task, so deliveries from the listing and the status stream are
/// applied one at a time and never interleave.
pub struct DocumentTracker<B: BlobStore + ?Sized, S: StatusChannel + ?Sized> {
    poller: ListingPoller<B>,
    listener: StatusListener<S>,
    sink: Arc<dyn NotificationSink>,
    config: TrackerConfig,
}

impl<B, S> DocumentTracker<B, S>
where
    B: BlobStore + ?Sized + 'static,
    S: StatusChannel + ?Sized + 'static,
{
    /// Create a tracker over the given collaborators.
    pub fn new(
        store: Arc<B>,
        channel: Arc<S>,
        sink: Arc<dyn NotificationSink>,
        config: TrackerConfig,
    ) -> Result<Self, TrackerError> {
        config.validate()?;
        Ok(Self {
            poller: ListingPoller::new(store).with_poll_interval(config.poll_interval),
            listener: StatusListener::new(channel),
            sink,
            config,
        })
    }

    /// Start tracking `user_id`.
    ///
    /// An empty `user_id` produces an empty view and installs no timer.
    pub fn start(&self, user_id: &str) -> TrackerHandle {
        let capacity = self.config.channel_capacity;
        let (snapshot_tx, mut snapshots) = mpsc::channel(capacity);
        let (status_tx, mut status_sets) = mpsc::channel(capacity);
        let (view_tx, view_rx) = watch::channel(Vec::new());

        let poller_sub = self.poller.watch(user_id, snapshot_tx);
        let listener_sub = self.listener.watch(user_id, status_tx);

        let sink = Arc::clone(&self.sink);
        let owner = user_id.to_string();
        let task = tokio::spawn(async move {
            let mut reconciler = Reconciler::new();
            let mut snapshots_open = true;
            let mut statuses_open = true;

            loop {
                let changed = tokio::select! {
                    snapshot = snapshots.recv(), if snapshots_open => match snapshot {
                        Some(files) => {
                            debug!(user_id = %owner, files = files.len(), "Applying listing snapshot");
                            reconciler.apply_snapshot(files);
                            true
                        }
                        None => {
                            snapshots_open = false;
                            false
                        }
                    },
                    statuses = status_sets.recv(), if statuses_open => match statuses {
                        Some(statuses) => {
                            for transition in reconciler.apply_statuses(statuses) {
                                info!(
                                    user_id = %owner,
                                    file_name = %transition.file_name,
                                    from = ?transition.from,
                                    to = %transition.to,
                                    "Document status changed"
                                );
                                sink.notify(transition.notification());
                            }
                            true
                        }
                        None => {
                            statuses_open = false;
                            false
                        }
                    },
                    else => break,
                };

                if changed {
                    view_tx.send_replace(reconciler.view());
                }
            }

            debug!(user_id = %owner, "Document tracker inputs closed");
        });

        info!(user_id, "Document tracking started");

        TrackerHandle {
            user_id: user_id.to_string(),
            views: view_rx,
            subscription: Subscription::group(
                "document-tracker",
                vec![poller_sub, listener_sub],
                &task,
            ),
            task,
        }
    }

    /// Stop tracking the previous user, then start tracking `user_id`.
    ///
    /// The previous user's listeners are cancelled, and its reconcile task
    /// has stopped, before any new subscription is opened.
    pub async fn switch_user(&self, previous: Option<TrackerHandle>, user_id: &str) -> TrackerHandle {
        if let Some(previous) = previous {
            info!(from = %previous.user_id, to = user_id, "Switching tracked user");
            previous.shutdown().await;
        }
        self.start(user_id)
    }
}

/// Handle to one user's running document tracking.
#[derive(Debug)]
pub struct TrackerHandle {
    user_id: String,
    views: watch::Receiver<Vec<DocumentView>>,
    subscription: Subscription,
    task: JoinHandle<()>,
}

impl TrackerHandle {
    /// The tracked user.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// A receiver that observes every recomputed document list.
    pub fn views(&self) -> watch::Receiver<Vec<DocumentView>> {
        self.views.clone()
    }

    /// The most recently computed document list.
    pub fn current(&self) -> Vec<DocumentView> {
        self.views.borrow().clone()
    }

    /// Stop the poller, the status listener and the reconciler.
    ///
    /// Safe to call more than once.
    pub fn cancel(&self) {
        self.subscription.cancel();
    }

    /// Cancel and wait until the reconcile task has stopped.
    ///
    /// No notification for this user is emitted once this returns.
    pub async fn shutdown(self) {
        self.cancel();
        if let Err(e) = self.task.await {
            if !e.is_cancelled() {
                warn!(user_id = %self.user_id, "Document tracker task failed: {}", e);
            }
        }
        debug!(user_id = %self.user_id, "Document tracking stopped");
    }

    /// Whether the tracking was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.subscription.is_cancelled()
    }
}
