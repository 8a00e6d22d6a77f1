//! # Dispatcher
//!
//! Outbound side of the bridge.
//!
//! Responsibilities:
//! - `Bridge`: decode + translate each inbound state line, publish the five
//!   Apollo envelopes and the chassis report through typed ports
//! - One isolated queue + worker per topic, so a slow sink never blocks a tick
//! - Log / JSON Lines file / UDP sinks

pub mod bridge;
pub mod chassis;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod outputs;
pub mod sinks;

pub use bridge::{Bridge, BridgeStats, PublishOutcome, TickReport, MODULE_NAME};
pub use chassis::ChassisFaker;
pub use contracts::{DataSink, OutboundMessage};
pub use error::{BridgeError, DispatcherError};
pub use handle::{TopicHandle, TopicPublisher};
pub use metrics::{MetricsSnapshot, TopicMetrics};
pub use outputs::{create_bridge, Outputs, TopicReport};
pub use sinks::{FileSink, LogSink, NetworkSink};
