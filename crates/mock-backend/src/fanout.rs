//! Per-key fan-out of full-state deliveries.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use assistant_core::{BackendError, RecordBatch, RecordStream};
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;

type Delivery = Result<RecordBatch, BackendError>;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub(crate) struct Fanout {
    subscribers: Mutex<HashMap<String, Vec<UnboundedSender<Delivery>>>>,
}

impl Fanout {
    /// Register a subscriber that first receives `initial`.
    pub(crate) fn subscribe(&self, key: &str, initial: RecordBatch) -> RecordStream {
        let (tx, rx) = unbounded();
        // Cannot fail: the receiver is alive
        let _ = tx.unbounded_send(Ok(initial));
        lock(&self.subscribers)
            .entry(key.to_string())
            .or_default()
            .push(tx);
        rx.boxed()
    }

    pub(crate) fn publish(&self, key: &str, batch: &RecordBatch) {
        self.send_each(key, || Ok(batch.clone()));
    }

    pub(crate) fn fail(&self, key: &str, message: &str) {
        self.send_each(key, || Err(BackendError::Transport(message.to_string())));
    }

    /// End every subscription for `key`.
    pub(crate) fn close(&self, key: &str) {
        lock(&self.subscribers).remove(key);
    }

    pub(crate) fn active(&self, key: &str) -> usize {
        lock(&self.subscribers)
            .get(key)
            .map_or(0, |senders| senders.iter().filter(|tx| !tx.is_closed()).count())
    }

    fn send_each(&self, key: &str, make: impl Fn() -> Delivery) {
        let mut subscribers = lock(&self.subscribers);
        if let Some(senders) = subscribers.get_mut(key) {
            senders.retain(|tx| tx.unbounded_send(make()).is_ok());
        }
    }
}
