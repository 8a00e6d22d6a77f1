//! Ingestion Pipeline main entry

use std::collections::HashMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{SourceConfig, SourceKind, StateMessage};
use tracing::{debug, info, instrument};

use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::error::{IngestionError, Result};
use crate::sender::StateSender;
use crate::source::StateSource;
use crate::sources::{MockStateConfig, MockStateSource, ReplayStateSource, UdpStateSource};

/// Default UDP bind address
pub const DEFAULT_UDP_BIND: &str = "0.0.0.0:5005";

/// Ingestion Pipeline
///
/// Owns one state source and the bounded channel it feeds. The sender half
/// is handed to the source on `start`, so the channel closes when the source
/// finishes (e.g. end of a replay file).
pub struct IngestionPipeline {
    source: Box<dyn StateSource>,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Data sender, consumed by `start`
    tx: Option<Sender<StateMessage>>,

    /// Data receiver
    rx: Option<Receiver<StateMessage>>,

    /// Receiver clone used for drop-oldest eviction
    evict: Receiver<StateMessage>,

    config: BackpressureConfig,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline over a source
    pub fn new(source: Box<dyn StateSource>, config: BackpressureConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity.max(1));

        Self {
            source,
            metrics: Arc::new(IngestionMetrics::new()),
            tx: Some(tx),
            evict: rx.clone(),
            rx: Some(rx),
            config,
        }
    }

    /// Build the pipeline described by a source config
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let source = build_source(config)?;
        Ok(Self::new(
            source,
            BackpressureConfig::new(config.queue_capacity, config.drop_policy),
        ))
    }

    /// Start the source
    ///
    /// Can only be called once.
    #[instrument(name = "ingestion_start", skip(self), fields(topic = %self.source.topic()))]
    pub fn start(&mut self) -> Result<()> {
        let tx = self.tx.take().ok_or(IngestionError::AlreadyStarted)?;
        let sender = StateSender::new(
            self.source.topic(),
            tx,
            self.evict.clone(),
            self.config.drop_policy,
            self.metrics.clone(),
        );
        self.source.start(sender)?;
        info!(
            capacity = self.config.channel_capacity,
            drop_policy = ?self.config.drop_policy,
            "ingestion started"
        );
        Ok(())
    }

    /// Stop the source
    pub fn stop(&self) {
        if self.source.is_running() {
            debug!(topic = %self.source.topic(), "stopping source");
            self.source.stop();
        }
    }

    /// Get data stream receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<StateMessage>> {
        self.rx.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Inbound topic
    pub fn topic(&self) -> &str {
        self.source.topic()
    }

    pub fn is_running(&self) -> bool {
        self.source.is_running()
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Build a state source from its config
pub fn build_source(config: &SourceConfig) -> Result<Box<dyn StateSource>> {
    let params = &config.params;
    let topic = config.topic.clone();

    let source: Box<dyn StateSource> = match config.kind {
        SourceKind::Udp => {
            let bind = params
                .get("bind")
                .map(String::as_str)
                .unwrap_or(DEFAULT_UDP_BIND);
            let bind: SocketAddr = bind
                .parse()
                .map_err(|e| IngestionError::invalid_param("bind", format!("{bind}: {e}")))?;
            Box::new(UdpStateSource::new(topic, bind))
        }
        SourceKind::Replay => {
            let path = params
                .get("path")
                .ok_or_else(|| IngestionError::invalid_param("path", "required for replay"))?;
            let rate_hz = param_or(params, "rate_hz", 0.0)?;
            let loop_playback = param_or(params, "loop", false)?;
            Box::new(ReplayStateSource::new(topic, path, rate_hz).with_loop(loop_playback))
        }
        SourceKind::Mock => {
            let defaults = MockStateConfig::default();
            let max_ticks = params
                .get("max_ticks")
                .map(|v| parse_param::<u64>("max_ticks", v))
                .transpose()?;
            Box::new(MockStateSource::new(MockStateConfig {
                topic,
                frequency_hz: param_or(params, "frequency_hz", defaults.frequency_hz)?,
                radius_m: param_or(params, "radius_m", defaults.radius_m)?,
                speed_mps: param_or(params, "speed_mps", defaults.speed_mps)?,
                center: (
                    param_or(params, "center_x", defaults.center.0)?,
                    param_or(params, "center_y", defaults.center.1)?,
                ),
                max_ticks,
            }))
        }
    };

    Ok(source)
}

fn param_or<T>(params: &HashMap<String, String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match params.get(key) {
        Some(value) => parse_param(key, value),
        None => Ok(default),
    }
}

fn parse_param<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| IngestionError::invalid_param(key, format!("'{value}': {e}")))
}
