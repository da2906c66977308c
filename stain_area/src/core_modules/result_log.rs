// THEORY:
// The `ResultLog` is the session memory of the engine: every completed estimation
// is appended here, in order, and nothing is ever removed or edited.
//
// It is a plain ordered vector with one writer. Readers either take a snapshot
// (`all`) or subscribe, which hands them the snapshot at subscription time plus a
// broadcast receiver that is notified of every later append. Results are shared
// behind `Arc`, so notifying many readers never copies pixel buffers.

use crate::core_modules::area_estimator::EstimationResult;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

const NOTIFICATION_CAPACITY: usize = 16;

/// What a new reader receives: the log as it was, and a feed of what comes next.
pub struct Subscription {
    pub snapshot: Vec<Arc<EstimationResult>>,
    /// Appends made after the snapshot was taken. A reader that falls more than the
    /// channel capacity behind receives `RecvError::Lagged` and can re-read `all()`.
    pub updates: broadcast::Receiver<Arc<EstimationResult>>,
}

/// Append-only, insertion-ordered record of completed estimations.
pub struct ResultLog {
    entries: Vec<Arc<EstimationResult>>,
    notifier: broadcast::Sender<Arc<EstimationResult>>,
}

impl Default for ResultLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultLog {
    pub fn new() -> Self {
        Self::with_capacity(NOTIFICATION_CAPACITY)
    }

    /// A log whose subscribers can buffer up to `capacity` unread appends.
    pub fn with_capacity(capacity: usize) -> Self {
        let (notifier, _) = broadcast::channel(capacity.max(1));
        Self {
            entries: Vec::new(),
            notifier,
        }
    }

    /// Adds `result` to the end of the log and notifies subscribers.
    pub fn append(&mut self, result: EstimationResult) -> Arc<EstimationResult> {
        let result = Arc::new(result);
        self.entries.push(result.clone());
        // Sending only fails when nobody is subscribed.
        let receivers = self.notifier.send(result.clone()).unwrap_or(0);
        debug!(entries = self.entries.len(), receivers, "appended estimation result");
        result
    }

    /// The current contents, oldest first.
    pub fn all(&self) -> &[Arc<EstimationResult>] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&Arc<EstimationResult>> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            snapshot: self.entries.clone(),
            updates: self.notifier.subscribe(),
        }
    }
}
