//! Cancellation handle shared by pollers and listeners.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

struct Inner {
    name: String,
    cancelled: AtomicBool,
    tasks: Vec<AbortHandle>,
    children: Vec<Subscription>,
}

/// Handle to a running poller or listener.
///
/// Cancelling stops the background work. Only the first call has any
/// effect; later calls (from any clone) are no-ops. Dropping the handle does
/// *not* cancel.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

impl Subscription {
    /// A handle for a component that started no background work.
    pub fn inert(name: impl Into<String>) -> Self {
        Self::build(name.into(), Vec::new(), Vec::new())
    }

    /// A handle that aborts `task` when cancelled.
    pub fn for_task<T>(name: impl Into<String>, task: &JoinHandle<T>) -> Self {
        Self::build(name.into(), vec![task.abort_handle()], Vec::new())
    }

    /// A handle that cancels `children` and then aborts `task`.
    pub fn group<T>(
        name: impl Into<String>,
        children: Vec<Subscription>,
        task: &JoinHandle<T>,
    ) -> Self {
        Self::build(name.into(), vec![task.abort_handle()], children)
    }

    fn build(name: String, tasks: Vec<AbortHandle>, children: Vec<Subscription>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name,
                cancelled: AtomicBool::new(false),
                tasks,
                children,
            }),
        }
    }

    /// Stop the background work. Safe to call more than once.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }

        for child in &self.inner.children {
            child.cancel();
        }
        for task in &self.inner.tasks {
            task.abort();
        }
        debug!(subscription = %self.inner.name, "Subscription cancelled");
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Name used in logs.
    pub fn name(&self) -> &str {
        &self.inner.name
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("name", &self.inner.name)
            .field("cancelled", &self.is_cancelled())
            .field("children", &self.inner.children.len())
            .finish()
    }
}
