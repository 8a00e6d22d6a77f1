//! Pipeline orchestrator - coordinates ingestion, the bridge and its outputs.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{BridgeBlueprint, StateMessage};
use dispatcher::{Bridge, BridgeError, Outputs, TickReport};
use ingestion::IngestionPipeline;
use observability::{
    record_decode_error, record_inbound_queue_depth, record_message_published, record_queue_depth,
    record_tick, record_tick_interval_ms, BridgeMetricsAggregator,
};
use tracing::{debug, info, warn};

use super::{PipelineStats, StopReason};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The bridge blueprint (already validated)
    pub blueprint: BridgeBlueprint,

    /// Stop after this many translated ticks (None = unlimited)
    pub max_ticks: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the source closes, a limit is hit or `shutdown` resolves
    ///
    /// Every output topic is drained before returning.
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        info!("Setting up outputs...");
        let (mut bridge, outputs) = dispatcher::create_bridge(blueprint)
            .await
            .context("Failed to create bridge outputs")?;

        info!(
            source = ?blueprint.source.kind,
            topic = %blueprint.source.topic,
            "Setting up ingestion..."
        );
        let mut ingestion = IngestionPipeline::from_config(&blueprint.source)
            .context("Failed to create state source")?;
        let rx = ingestion
            .take_receiver()
            .context("Failed to get ingestion receiver")?;
        ingestion.start().context("Failed to start state source")?;

        info!(max_ticks = ?self.config.max_ticks, "Bridge running");

        let mut aggregator = BridgeMetricsAggregator::new();
        let timeout = async {
            match self.config.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(shutdown);
        tokio::pin!(timeout);

        let stop_reason = loop {
            tokio::select! {
                message = rx.recv() => {
                    let Ok(message) = message else {
                        info!("State source finished");
                        break StopReason::SourceClosed;
                    };
                    record_inbound_queue_depth(ingestion.topic(), rx.len());
                    self.handle_message(&mut bridge, &outputs, &message, &mut aggregator);

                    if let Some(max) = self.config.max_ticks {
                        if bridge.stats().ticks >= max {
                            info!(ticks = max, "Reached max ticks limit");
                            break StopReason::MaxTicks;
                        }
                    }
                }
                _ = &mut shutdown => break StopReason::Signal,
                _ = &mut timeout => {
                    warn!(timeout_secs = ?self.config.timeout, "Bridge timed out");
                    break StopReason::Timeout;
                }
            }
        };

        // Shutdown
        info!("Shutting down bridge...");
        ingestion.stop();
        let ingestion_metrics = ingestion.metrics().snapshot();
        let bridge_stats = bridge.stats();
        // Publishers inside the bridge keep the topic workers alive
        drop(bridge);
        let topics = outputs.shutdown().await;

        let stats = PipelineStats {
            bridge: bridge_stats,
            ingestion: ingestion_metrics,
            topics,
            summary: aggregator.summary(),
            duration: start_time.elapsed(),
            stop_reason,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            rate_hz = format!("{:.2}", stats.tick_rate()),
            "Bridge shutdown complete"
        );

        Ok(stats)
    }

    fn handle_message(
        &self,
        bridge: &mut Bridge,
        outputs: &Outputs,
        message: &StateMessage,
        aggregator: &mut BridgeMetricsAggregator,
    ) {
        match bridge.on_message(&message.payload) {
            Ok(report) => {
                record_report(&report, aggregator);
                for topic in outputs.metrics() {
                    record_queue_depth(&topic.topic, topic.metrics.queue_len);
                }
                debug!(
                    sequence = message.sequence,
                    timestamp_sec = report.timestamp_sec,
                    speed_mps = format!("{:.3}", report.forward_speed),
                    heading_deg = format!("{:.2}", report.euler.yaw),
                    published = report.published(),
                    failed = report.failed(),
                    "Tick translated"
                );
            }
            Err(BridgeError::Decode(e)) => {
                record_decode_error(e.reason());
                aggregator.record_decode_error(e.reason());
            }
        }
    }
}

fn record_report(report: &TickReport, aggregator: &mut BridgeMetricsAggregator) {
    record_tick(report.timestamp_sec, report.forward_speed, &report.euler);
    if let Some(interval_ms) = aggregator.record_tick(report.timestamp_sec, report.forward_speed)
    {
        record_tick_interval_ms(interval_ms);
    }

    for outcome in &report.outcomes {
        record_message_published(&outcome.topic, outcome.is_ok());
        aggregator.record_publish(&outcome.topic, outcome.is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{OutputChannel, OutputConfig, SinkType, SourceKind};
    use std::collections::HashMap;
    use std::io::Write;

    const LINE: &str = "10.0 5.0 0.0 0.0 0.0 0.0 1.0 0 0 0 1 0 0 0 0 0 2.5 100.0";

    fn replay_blueprint(path: &std::path::Path) -> BridgeBlueprint {
        let mut blueprint = BridgeBlueprint::default();
        blueprint.source.kind = SourceKind::Replay;
        blueprint.source.queue_capacity = 64;
        blueprint
            .source
            .params
            .insert("path".to_string(), path.display().to_string());
        blueprint.outputs = OutputChannel::ALL
            .iter()
            .map(|&channel| OutputConfig {
                queue_capacity: 16,
                ..OutputConfig::log(channel)
            })
            .collect();
        blueprint
    }

    #[tokio::test]
    async fn test_replay_runs_to_completion() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{LINE}").unwrap();
        writeln!(file, "garbage").unwrap();
        writeln!(file, "{LINE}").unwrap();

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: replay_blueprint(file.path()),
            max_ticks: None,
            timeout: Some(Duration::from_secs(10)),
            metrics_port: None,
        });
        let stats = pipeline.run(std::future::pending()).await.unwrap();

        assert_eq!(stats.stop_reason, StopReason::SourceClosed);
        assert_eq!(stats.bridge.ticks, 2);
        assert_eq!(stats.bridge.decode_errors, 1);
        assert_eq!(stats.bridge.published, 12);
        assert_eq!(stats.summary.decode_errors["field_count"], 1);
        assert!(stats.topics.iter().all(|t| t.metrics.written == 2));
    }

    #[tokio::test]
    async fn test_mock_stops_at_max_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let mut blueprint = BridgeBlueprint::default();
        blueprint.source.kind = SourceKind::Mock;
        blueprint.source.queue_capacity = 64;
        blueprint
            .source
            .params
            .insert("frequency_hz".to_string(), "200".to_string());
        blueprint.outputs = vec![OutputConfig {
            channel: OutputChannel::Chassis,
            topic: None,
            sink_type: SinkType::File,
            queue_capacity: 16,
            params: HashMap::from([(
                "base_path".to_string(),
                dir.path().display().to_string(),
            )]),
        }];

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint,
            max_ticks: Some(3),
            timeout: Some(Duration::from_secs(10)),
            metrics_port: None,
        });
        let stats = pipeline.run(std::future::pending()).await.unwrap();

        assert_eq!(stats.stop_reason, StopReason::MaxTicks);
        assert_eq!(stats.bridge.ticks, 3);

        let chassis = std::fs::read_to_string(dir.path().join("apollo_canbus_chassis.jsonl"))
            .unwrap();
        assert_eq!(chassis.lines().count(), 3);
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_udp_bridge() {
        let mut blueprint = BridgeBlueprint::default();
        blueprint
            .source
            .params
            .insert("bind".to_string(), "127.0.0.1:0".to_string());

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint,
            max_ticks: None,
            timeout: None,
            metrics_port: None,
        });
        let stats = pipeline
            .run(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();

        assert_eq!(stats.stop_reason, StopReason::Signal);
        assert_eq!(stats.bridge.received, 0);
    }
}
