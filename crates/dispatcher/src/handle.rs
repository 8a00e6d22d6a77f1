//! TopicHandle - one outbound topic with an isolated queue and worker task

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace};

use contracts::{ApolloMessage, ContractError, DataSink, OutboundMessage, Publisher};

use crate::metrics::TopicMetrics;

/// Cloneable, non-blocking publisher onto a topic's queue
///
/// Sequence numbers are per topic and start at 1. A message refused by a
/// full queue still consumes its sequence number, so gaps show drops.
#[derive(Clone)]
pub struct TopicPublisher {
    topic: Arc<str>,
    tx: mpsc::Sender<OutboundMessage>,
    sequence: Arc<AtomicU64>,
    metrics: Arc<TopicMetrics>,
}

impl TopicPublisher {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn metrics(&self) -> &Arc<TopicMetrics> {
        &self.metrics
    }

    /// Enqueue one message, returning its sequence number
    pub fn try_send(&self, message: ApolloMessage) -> Result<u64, ContractError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let outbound = OutboundMessage {
            topic: self.topic.to_string(),
            sequence,
            published_at: Utc::now(),
            message,
        };

        match self.tx.try_send(outbound) {
            Ok(()) => {
                self.metrics
                    .record_enqueued(self.tx.max_capacity() - self.tx.capacity());
                Ok(sequence)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_dropped();
                trace!(topic = %self.topic, sequence, "queue full, message dropped");
                Err(ContractError::QueueFull {
                    topic: self.topic.to_string(),
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics.record_dropped();
                Err(ContractError::TopicClosed {
                    topic: self.topic.to_string(),
                })
            }
        }
    }
}

impl<M> Publisher<M> for TopicPublisher
where
    M: Into<ApolloMessage>,
{
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, message: M) -> Result<(), ContractError> {
        self.try_send(message.into()).map(|_| ())
    }
}

/// Handle to a running topic worker
pub struct TopicHandle {
    publisher: TopicPublisher,
    sink_name: String,
    worker_handle: JoinHandle<()>,
}

impl TopicHandle {
    /// Create a new TopicHandle and spawn the worker task
    pub fn spawn<S>(topic: impl Into<Arc<str>>, sink: S, queue_capacity: usize) -> Self
    where
        S: DataSink + Send + 'static,
    {
        let topic = topic.into();
        let sink_name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(TopicMetrics::new());

        let worker_handle = tokio::spawn(topic_worker(
            sink,
            rx,
            Arc::clone(&metrics),
            topic.to_string(),
        ));

        Self {
            publisher: TopicPublisher {
                topic,
                tx,
                sequence: Arc::new(AtomicU64::new(0)),
                metrics,
            },
            sink_name,
            worker_handle,
        }
    }

    pub fn topic(&self) -> &str {
        self.publisher.topic()
    }

    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    pub fn metrics(&self) -> &Arc<TopicMetrics> {
        self.publisher.metrics()
    }

    /// A publisher feeding this topic
    pub fn publisher(&self) -> TopicPublisher {
        self.publisher.clone()
    }

    /// Shutdown the worker gracefully
    ///
    /// The worker drains its queue once every publisher clone is dropped.
    #[instrument(name = "topic_handle_shutdown", skip(self), fields(topic = %self.topic()))]
    pub async fn shutdown(self) {
        let topic = self.publisher.topic.clone();
        drop(self.publisher);
        if let Err(e) = self.worker_handle.await {
            error!(topic = %topic, error = ?e, "worker task panicked");
        }
        debug!(topic = %topic, "topic handle shutdown complete");
    }
}

/// Worker task that drains the queue into the sink
#[instrument(name = "topic_worker_loop", skip(sink, rx, metrics, topic), fields(topic = %topic))]
async fn topic_worker<S: DataSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<OutboundMessage>,
    metrics: Arc<TopicMetrics>,
    topic: String,
) {
    debug!(sink = %sink.name(), "topic worker started");

    while let Some(message) = rx.recv().await {
        match sink.write(&message).await {
            Ok(()) => metrics.record_written(rx.len()),
            Err(e) => {
                metrics.record_failed(rx.len());
                error!(
                    sink = %sink.name(),
                    sequence = message.sequence,
                    error = %e,
                    "write failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %sink.name(), error = %e, "flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %sink.name(), error = %e, "close failed on shutdown");
    }

    debug!(sink = %sink.name(), "topic worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{GnssBestPose, GnssStatus};
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};

    /// Sink recording what it was handed
    struct RecordingSink {
        written: Arc<Mutex<Vec<OutboundMessage>>>,
        fail: bool,
        delay_ms: u64,
    }

    impl RecordingSink {
        fn new(fail: bool, delay_ms: u64) -> (Self, Arc<Mutex<Vec<OutboundMessage>>>) {
            let written = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    written: Arc::clone(&written),
                    fail,
                    delay_ms,
                },
                written,
            )
        }
    }

    impl DataSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        async fn write(&mut self, message: &OutboundMessage) -> Result<(), ContractError> {
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail {
                return Err(ContractError::sink_write("recording", "mock failure"));
            }
            self.written.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publish_in_order_with_sequence() {
        let (sink, written) = RecordingSink::new(false, 0);
        let handle = TopicHandle::spawn("/apollo/sensor/gnss/gnss_status", sink, 8);
        let publisher = handle.publisher();

        for _ in 0..3 {
            Publisher::<GnssStatus>::publish(&publisher, GnssStatus::default()).unwrap();
        }
        drop(publisher);
        handle.shutdown().await;

        let written = written.lock().unwrap();
        let sequences: Vec<u64> = written.iter().map(|m| m.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert!(written
            .iter()
            .all(|m| m.topic == "/apollo/sensor/gnss/gnss_status"));
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (sink, _written) = RecordingSink::new(false, 100);
        let handle = TopicHandle::spawn("/slow", sink, 1);
        let publisher = handle.publisher();

        let results: Vec<_> = (0..10)
            .map(|_| publisher.try_send(GnssBestPose::default().into()))
            .collect();

        assert!(results
            .iter()
            .any(|r| matches!(r, Err(ContractError::QueueFull { .. }))));
        assert!(handle.metrics().dropped() > 0);

        drop(publisher);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_write_failure_keeps_worker_alive() {
        let (sink, _written) = RecordingSink::new(true, 0);
        let handle = TopicHandle::spawn("/failing", sink, 8);
        let publisher = handle.publisher();

        for _ in 0..3 {
            publisher.try_send(GnssStatus::default().into()).unwrap();
        }
        drop(publisher);
        let metrics = Arc::clone(handle.metrics());
        handle.shutdown().await;

        assert_eq!(metrics.failed(), 3);
        assert_eq!(metrics.written(), 0);
    }
}
