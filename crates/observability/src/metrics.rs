//! Bridge metrics
//!
//! Prometheus-facing recorders plus an in-memory aggregator for the run
//! summary.

use std::collections::BTreeMap;

use contracts::EulerAngles;
use metrics::{counter, gauge, histogram};

/// Record one decoded and fanned-out tick
///
/// # Example
///
/// ```ignore
/// if let Ok(report) = bridge.on_message(&message.payload) {
///     record_tick(report.timestamp_sec, report.forward_speed, &report.euler);
/// }
/// ```
pub fn record_tick(timestamp_sec: f64, forward_speed: f64, euler: &EulerAngles) {
    counter!("carla_apollo_bridge_ticks_total").increment(1);
    gauge!("carla_apollo_bridge_state_timestamp_seconds").set(timestamp_sec);
    gauge!("carla_apollo_bridge_forward_speed_mps").set(forward_speed);
    gauge!("carla_apollo_bridge_heading_deg").set(euler.yaw);
}

/// Record the simulation-time gap between consecutive ticks
pub fn record_tick_interval_ms(interval_ms: f64) {
    histogram!("carla_apollo_bridge_tick_interval_ms").record(interval_ms);
}

/// Record a dropped malformed state line
pub fn record_decode_error(reason: &str) {
    counter!(
        "carla_apollo_bridge_decode_errors_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record one publish attempt on an outbound topic
pub fn record_message_published(topic: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "carla_apollo_bridge_messages_published_total",
        "topic" => topic.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record an outbound topic's queue depth
pub fn record_queue_depth(topic: &str, depth: usize) {
    gauge!(
        "carla_apollo_bridge_queue_depth",
        "topic" => topic.to_string()
    )
    .set(depth as f64);
}

/// Record how many state lines wait in the inbound queue
pub fn record_inbound_queue_depth(topic: &str, depth: usize) {
    gauge!(
        "carla_apollo_bridge_inbound_queue_depth",
        "topic" => topic.to_string()
    )
    .set(depth as f64);
}

/// Bridge metrics aggregator
///
/// Aggregates in memory for the end-of-run summary.
#[derive(Debug, Clone, Default)]
pub struct BridgeMetricsAggregator {
    /// Ticks that decoded and fanned out
    pub total_ticks: u64,

    /// Malformed lines, by reason
    pub decode_errors: BTreeMap<String, u64>,

    /// Successful publishes
    pub messages_published: u64,

    /// Refused publishes, by topic
    pub publish_failures: BTreeMap<String, u64>,

    /// Ticks whose timestamp did not advance
    pub non_monotonic_ticks: u64,

    /// Forward speed (m/s)
    pub speed_stats: RunningStats,

    /// Simulation-time gap between ticks (ms)
    pub interval_stats: RunningStats,

    last_timestamp: Option<f64>,
}

impl BridgeMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with one tick, returning the interval since the previous tick
    /// in milliseconds
    pub fn record_tick(&mut self, timestamp_sec: f64, forward_speed: f64) -> Option<f64> {
        self.total_ticks += 1;
        self.speed_stats.push(forward_speed);

        let interval_ms = self
            .last_timestamp
            .map(|previous| (timestamp_sec - previous) * 1000.0);
        if let Some(ms) = interval_ms {
            if ms <= 0.0 {
                self.non_monotonic_ticks += 1;
            } else {
                self.interval_stats.push(ms);
            }
        }
        self.last_timestamp = Some(timestamp_sec);
        interval_ms
    }

    pub fn record_decode_error(&mut self, reason: &str) {
        *self.decode_errors.entry(reason.to_string()).or_insert(0) += 1;
    }

    pub fn record_publish(&mut self, topic: &str, success: bool) {
        if success {
            self.messages_published += 1;
        } else {
            *self.publish_failures.entry(topic.to_string()).or_insert(0) += 1;
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let total_decode_errors: u64 = self.decode_errors.values().sum();
        let total_publish_failures: u64 = self.publish_failures.values().sum();
        let received = self.total_ticks + total_decode_errors;
        let attempts = self.messages_published + total_publish_failures;

        MetricsSummary {
            total_ticks: self.total_ticks,
            total_decode_errors,
            decode_error_rate: percent(total_decode_errors, received),
            messages_published: self.messages_published,
            total_publish_failures,
            publish_failure_rate: percent(total_publish_failures, attempts),
            non_monotonic_ticks: self.non_monotonic_ticks,
            forward_speed_mps: StatsSummary::from(&self.speed_stats),
            tick_interval_ms: StatsSummary::from(&self.interval_stats),
            decode_errors: self.decode_errors.clone(),
            publish_failures: self.publish_failures.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_ticks: u64,
    pub total_decode_errors: u64,
    pub decode_error_rate: f64,
    pub messages_published: u64,
    pub total_publish_failures: u64,
    pub publish_failure_rate: f64,
    pub non_monotonic_ticks: u64,
    pub forward_speed_mps: StatsSummary,
    pub tick_interval_ms: StatsSummary,
    pub decode_errors: BTreeMap<String, u64>,
    pub publish_failures: BTreeMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Bridge Metrics Summary ===")?;
        writeln!(f, "Ticks: {}", self.total_ticks)?;
        writeln!(
            f,
            "Malformed lines: {} ({:.2}%)",
            self.total_decode_errors, self.decode_error_rate
        )?;
        writeln!(f, "Messages published: {}", self.messages_published)?;
        writeln!(
            f,
            "Publish failures: {} ({:.2}%)",
            self.total_publish_failures, self.publish_failure_rate
        )?;
        writeln!(f, "Non-monotonic ticks: {}", self.non_monotonic_ticks)?;
        writeln!(f, "Forward speed (m/s): {}", self.forward_speed_mps)?;
        writeln!(f, "Tick interval (ms): {}", self.tick_interval_ms)?;

        if !self.decode_errors.is_empty() {
            writeln!(f, "Malformed lines by reason:")?;
            for (reason, count) in &self.decode_errors {
                writeln!(f, "  {reason}: {count}")?;
            }
        }
        if !self.publish_failures.is_empty() {
            writeln!(f, "Publish failures by topic:")?;
            for (topic, count) in &self.publish_failures {
                writeln!(f, "  {topic}: {count}")?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
