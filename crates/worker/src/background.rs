//! Fire-and-forget store writes.
//!
//! Writes that must not delay the caller run as spawned tasks. A spawned
//! task is detached from the caller's future, so cancelling a request never
//! aborts a write that is already in flight.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

/// Tracker for spawned background writes.
#[derive(Clone, Default)]
pub struct BackgroundWrites {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` on the runtime and keep its handle until it finishes.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tracked tasks that have not finished yet.
    pub fn pending(&self) -> usize {
        let handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every tracked task, including ones spawned while waiting.
    pub async fn settle(&self) {
        loop {
            let batch = std::mem::take(&mut *self.handles.lock().unwrap_or_else(PoisonError::into_inner));
            if batch.is_empty() {
                return;
            }
            for handle in batch {
                if let Err(err) = handle.await {
                    tracing::warn!(error = %err, "background write task failed");
                }
            }
        }
    }
}
