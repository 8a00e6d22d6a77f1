//! Pipeline statistics.

use std::fmt;
use std::time::Duration;

use dispatcher::{BridgeStats, TopicReport};
use observability::MetricsSummary;

/// Why the bridge stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopReason {
    /// The source finished (end of replay, mock tick limit)
    #[default]
    SourceClosed,
    /// `--max-ticks` reached
    MaxTicks,
    /// `--timeout` elapsed
    Timeout,
    /// Ctrl+C / SIGTERM
    Signal,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SourceClosed => "source closed",
            Self::MaxTicks => "max ticks reached",
            Self::Timeout => "timeout",
            Self::Signal => "shutdown signal",
        })
    }
}

/// Statistics from a bridge run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Bridge counters
    pub bridge: BridgeStats,

    /// Inbound transport counters
    pub ingestion: ingestion::MetricsSnapshot,

    /// Final metrics per output topic, after draining
    pub topics: Vec<TopicReport>,

    /// Per-tick aggregates
    pub summary: MetricsSummary,

    /// Total duration of the run
    pub duration: Duration,

    pub stop_reason: StopReason,
}

impl PipelineStats {
    /// Translated ticks per wall-clock second
    pub fn tick_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.bridge.ticks as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Bridge Statistics ===\n");

        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Stopped: {}", self.stop_reason);
        println!("  Messages received: {}", self.ingestion.messages_received);
        println!("  Inbound drops: {}", self.ingestion.messages_dropped);
        println!("  Ticks translated: {}", self.bridge.ticks);
        println!("  Tick rate: {:.2} Hz", self.tick_rate());

        println!("\n{}", self.summary);

        if !self.topics.is_empty() {
            println!("Output topics");
            for topic in &self.topics {
                let m = &topic.metrics;
                println!(
                    "  {} [{}]: written={} dropped={} failed={}",
                    topic.topic, topic.sink_name, m.written, m.dropped, m.failed
                );
            }
        }

        println!();
    }
}
