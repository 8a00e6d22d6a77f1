//! LogSink - logs a message summary via tracing

use contracts::{ApolloMessage, ContractError, DataSink, OutboundMessage};
use tracing::{info, instrument};

/// Sink that logs message summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_summary(&self, message: &OutboundMessage) {
        let stamp = message.message.timestamp_sec();
        match &message.message {
            ApolloMessage::Gps(gps) => {
                let p = gps.localization.position;
                info!(
                    sink = %self.name,
                    topic = %message.topic,
                    sequence = message.sequence,
                    timestamp_sec = ?stamp,
                    x = p.x,
                    y = p.y,
                    z = p.z,
                    "gps odometry"
                );
            }
            ApolloMessage::Chassis(chassis) => {
                info!(
                    sink = %self.name,
                    topic = %message.topic,
                    sequence = message.sequence,
                    speed_mps = chassis.speed_mps,
                    gear = chassis.gear_location.code(),
                    "chassis"
                );
            }
            other => {
                info!(
                    sink = %self.name,
                    topic = %message.topic,
                    sequence = message.sequence,
                    kind = other.kind(),
                    timestamp_sec = ?stamp,
                    "message published"
                );
            }
        }
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, message),
        fields(sink = %self.name, sequence = message.sequence)
    )]
    async fn write(&mut self, message: &OutboundMessage) -> Result<(), ContractError> {
        self.log_summary(message);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
