//! Outputs - builds and owns the topic workers behind the bridge's ports

use contracts::{BridgeBlueprint, BridgePorts, OutputChannel, OutputConfig, SinkType};
use tracing::{info, instrument};
use translator::Translator;

use crate::bridge::{Bridge, MODULE_NAME};
use crate::chassis::ChassisFaker;
use crate::error::DispatcherError;
use crate::handle::{TopicHandle, TopicPublisher};
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink, NetworkSink};

/// The running topic workers, one per output channel
pub struct Outputs {
    handles: Vec<(OutputChannel, TopicHandle)>,
}

impl Outputs {
    /// Spawn one topic worker per channel as the blueprint routes it
    #[instrument(name = "outputs_from_blueprint", skip(blueprint))]
    pub async fn from_blueprint(blueprint: &BridgeBlueprint) -> Result<Self, DispatcherError> {
        let mut handles = Vec::with_capacity(OutputChannel::ALL.len());
        for config in blueprint.resolved_outputs() {
            let handle = create_topic_handle(&config).await?;
            handles.push((config.channel, handle));
        }
        info!(topics = handles.len(), "outputs ready");
        Ok(Self { handles })
    }

    /// Assemble from pre-built handles (for testing)
    pub fn with_handles(handles: Vec<(OutputChannel, TopicHandle)>) -> Self {
        Self { handles }
    }

    pub fn publisher(&self, channel: OutputChannel) -> Result<TopicPublisher, DispatcherError> {
        self.handles
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, handle)| handle.publisher())
            .ok_or(DispatcherError::MissingChannel(channel))
    }

    /// Ports feeding these workers, chassis behind a `ChassisFaker`
    pub fn ports(&self) -> Result<BridgePorts, DispatcherError> {
        Ok(BridgePorts {
            gps: Box::new(self.publisher(OutputChannel::GpsOdometry)?),
            corrected_imu: Box::new(self.publisher(OutputChannel::CorrectedImu)?),
            gnss_status: Box::new(self.publisher(OutputChannel::GnssStatus)?),
            ins_status: Box::new(self.publisher(OutputChannel::InsStatus)?),
            gnss_best_pose: Box::new(self.publisher(OutputChannel::GnssBestPose)?),
            chassis: Box::new(ChassisFaker::new(
                Box::new(self.publisher(OutputChannel::Chassis)?),
                MODULE_NAME,
            )),
        })
    }

    /// Current metrics per channel
    pub fn metrics(&self) -> Vec<TopicReport> {
        self.handles
            .iter()
            .map(|(channel, handle)| TopicReport::new(*channel, handle))
            .collect()
    }

    /// Drain and close every topic worker, returning the final metrics
    ///
    /// Publishers still alive elsewhere (e.g. inside a `Bridge`) keep their
    /// worker running, so drop the bridge first.
    #[instrument(name = "outputs_shutdown", skip(self))]
    pub async fn shutdown(self) -> Vec<TopicReport> {
        let mut reports = Vec::with_capacity(self.handles.len());
        for (channel, handle) in self.handles {
            let mut report = TopicReport::new(channel, &handle);
            let metrics = handle.metrics().clone();
            handle.shutdown().await;
            report.metrics = metrics.snapshot();
            reports.push(report);
        }
        info!("outputs shutdown complete");
        reports
    }
}

/// Metrics of one output topic
#[derive(Debug, Clone, PartialEq)]
pub struct TopicReport {
    pub channel: OutputChannel,
    pub topic: String,
    pub sink_name: String,
    pub metrics: MetricsSnapshot,
}

impl TopicReport {
    fn new(channel: OutputChannel, handle: &TopicHandle) -> Self {
        Self {
            channel,
            topic: handle.topic().to_string(),
            sink_name: handle.sink_name().to_string(),
            metrics: handle.metrics().snapshot(),
        }
    }
}

/// Create a TopicHandle from its routing
#[instrument(
    name = "outputs_create_topic_handle",
    skip(config),
    fields(channel = %config.channel, sink_type = ?config.sink_type)
)]
async fn create_topic_handle(config: &OutputConfig) -> Result<TopicHandle, DispatcherError> {
    let topic = config.topic_name();
    let sink_name = format!("{}_{}", config.channel, sink_label(config.sink_type));

    match config.sink_type {
        SinkType::Log => Ok(TopicHandle::spawn(
            topic,
            LogSink::new(sink_name),
            config.queue_capacity,
        )),
        SinkType::File => {
            let sink = FileSink::from_params(sink_name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(topic, e.to_string()))?;
            Ok(TopicHandle::spawn(topic, sink, config.queue_capacity))
        }
        SinkType::Network => {
            let sink = NetworkSink::from_params(sink_name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(topic, e.to_string()))?;
            Ok(TopicHandle::spawn(topic, sink, config.queue_capacity))
        }
    }
}

fn sink_label(sink_type: SinkType) -> &'static str {
    match sink_type {
        SinkType::Log => "log",
        SinkType::File => "file",
        SinkType::Network => "network",
    }
}

/// Build the outputs and a bridge publishing into them
#[instrument(name = "bridge_create", skip(blueprint))]
pub async fn create_bridge(blueprint: &BridgeBlueprint) -> Result<(Bridge, Outputs), DispatcherError> {
    let outputs = Outputs::from_blueprint(blueprint).await?;
    let bridge = Bridge::new(
        Translator::new(blueprint.frames),
        outputs.ports()?,
        blueprint.status,
    );
    Ok((bridge, outputs))
}
