//! StateSender - source-side handle onto the inbound channel

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_channel::{Receiver, Sender, TrySendError};
use contracts::StateMessage;
use tracing::{trace, warn};

use crate::config::{DropPolicy, IngestionMetrics};

/// Wraps payloads into `StateMessage`s and applies the drop policy
///
/// Holds a receiver clone so `DropOldest` can evict the queued head instead
/// of discarding the newest state.
#[derive(Clone)]
pub struct StateSender {
    topic: Arc<str>,
    tx: Sender<StateMessage>,
    evict: Receiver<StateMessage>,
    drop_policy: DropPolicy,
    metrics: Arc<IngestionMetrics>,
    sequence: Arc<AtomicU64>,
}

impl StateSender {
    pub fn new(
        topic: impl Into<Arc<str>>,
        tx: Sender<StateMessage>,
        evict: Receiver<StateMessage>,
        drop_policy: DropPolicy,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            topic: topic.into(),
            tx,
            evict,
            drop_policy,
            metrics,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    fn wrap(&self, payload: String) -> StateMessage {
        StateMessage {
            topic: self.topic.to_string(),
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            payload,
        }
    }

    /// Non-blocking send, applying the drop policy when the queue is full
    ///
    /// Returns false once the channel is closed.
    pub fn send(&self, payload: String) -> bool {
        let message = self.wrap(payload);
        self.metrics.record_received();

        let rejected = match self.tx.try_send(message) {
            Ok(()) => {
                self.metrics.update_queue_len(self.tx.len());
                return true;
            }
            Err(TrySendError::Closed(_)) => {
                warn!(topic = %self.topic, "state channel closed");
                return false;
            }
            Err(TrySendError::Full(message)) => message,
        };

        self.metrics.record_dropped();
        match self.drop_policy {
            DropPolicy::DropNewest => {
                trace!(topic = %self.topic, sequence = rejected.sequence, "state dropped (newest)");
            }
            DropPolicy::DropOldest => {
                if let Ok(evicted) = self.evict.try_recv() {
                    trace!(topic = %self.topic, sequence = evicted.sequence, "state dropped (oldest)");
                }
                if self.tx.try_send(rejected).is_err() {
                    // lost the race against another producer
                    self.metrics.record_dropped();
                }
            }
        }
        self.metrics.update_queue_len(self.tx.len());
        !self.tx.is_closed()
    }

    /// Lossless send, waits for queue space
    ///
    /// Returns false once the channel is closed.
    pub async fn send_wait(&self, payload: String) -> bool {
        let message = self.wrap(payload);
        self.metrics.record_received();
        match self.tx.send(message).await {
            Ok(()) => {
                self.metrics.update_queue_len(self.tx.len());
                true
            }
            Err(_) => {
                warn!(topic = %self.topic, "state channel closed");
                false
            }
        }
    }
}
