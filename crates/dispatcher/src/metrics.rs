//! Per-topic counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for one outbound topic
///
/// Every published message ends up in exactly one of `dropped` (refused at
/// the queue) or `enqueued`; every enqueued message later lands in `written`
/// or `failed`.
#[derive(Debug, Default)]
pub struct TopicMetrics {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
    queue_len: AtomicUsize,
}

impl TopicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_enqueued(&self, queue_len: usize) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        self.queue_len.store(queue_len, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_written(&self, queue_len: usize) {
        self.written.fetch_add(1, Ordering::Relaxed);
        self.queue_len.store(queue_len, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self, queue_len: usize) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.queue_len.store(queue_len, Ordering::Relaxed);
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped(),
            written: self.written(),
            failed: self.failed(),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `TopicMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub dropped: u64,
    pub written: u64,
    pub failed: u64,
    pub queue_len: usize,
}

impl MetricsSnapshot {
    /// Messages offered to the topic
    pub fn offered(&self) -> u64 {
        self.enqueued + self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offered_counts_drops() {
        let metrics = TopicMetrics::new();
        metrics.record_enqueued(1);
        metrics.record_dropped();
        metrics.record_written(0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.offered(), 2);
        assert_eq!(snapshot.written, 1);
        assert_eq!(snapshot.queue_len, 0);
    }
}
