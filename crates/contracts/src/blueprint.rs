//! BridgeBlueprint - Config Loader output
//!
//! Describes the complete bridge setup: inbound source, frame reconciliation
//! constants, constant status values and per-channel output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{GearPosition, InsStatusType, OutputChannel};

/// Heading-zero reconciliation (degrees subtracted from yaw).
///
/// The simulator measures heading from north, Apollo from east.
pub const HEADING_ZERO_OFFSET_DEG: f64 = 90.0;

/// Map origin reconciliation (metres added to y).
///
/// Northing between the simulator world origin and the Apollo map origin.
pub const MAP_NORTHING_OFFSET_M: f64 = 182.5;

/// Default inbound topic carrying the simulator state line
pub const DEFAULT_STATE_TOPIC: &str = "/player_vehicle";

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete bridge configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Inbound state source
    #[serde(default)]
    pub source: SourceConfig,

    /// Frame reconciliation constants
    #[serde(default)]
    pub frames: FrameConfig,

    /// Constant status values
    #[serde(default)]
    pub status: StatusConfig,

    /// Output routing (channels not listed use a log sink on their default topic)
    #[serde(default)]
    pub outputs: Vec<OutputConfig>,
}

impl BridgeBlueprint {
    /// Output routing for a channel, falling back to the default log route
    pub fn output_for(&self, channel: OutputChannel) -> OutputConfig {
        self.outputs
            .iter()
            .find(|o| o.channel == channel)
            .cloned()
            .unwrap_or_else(|| OutputConfig::log(channel))
    }

    /// Routing for every channel, in channel order
    pub fn resolved_outputs(&self) -> Vec<OutputConfig> {
        OutputChannel::ALL
            .iter()
            .map(|&channel| self.output_for(channel))
            .collect()
    }
}

/// Inbound source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind
    #[serde(default)]
    pub kind: SourceKind,

    /// Inbound topic name
    #[serde(default = "default_state_topic")]
    pub topic: String,

    /// Inbound queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// What to drop when the inbound queue is full
    #[serde(default)]
    pub drop_policy: DropPolicy,

    /// Kind-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            topic: default_state_topic(),
            queue_capacity: default_queue_capacity(),
            drop_policy: DropPolicy::default(),
            params: HashMap::new(),
        }
    }
}

fn default_state_topic() -> String {
    DEFAULT_STATE_TOPIC.to_string()
}

/// Source kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// One state line per UDP datagram
    #[default]
    Udp,
    /// Replay a recorded text file
    Replay,
    /// Synthetic vehicle
    Mock,
}

/// Drop policy (when the queue is full)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Drop the oldest queued message, keep the latest
    #[default]
    DropOldest,
    /// Drop the incoming message
    DropNewest,
}

/// Frame reconciliation constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameConfig {
    /// Degrees subtracted from yaw
    #[serde(default = "default_heading_offset")]
    pub heading_offset_deg: f64,

    /// Metres added to y
    #[serde(default = "default_northing_offset")]
    pub northing_offset_m: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            heading_offset_deg: HEADING_ZERO_OFFSET_DEG,
            northing_offset_m: MAP_NORTHING_OFFSET_M,
        }
    }
}

fn default_heading_offset() -> f64 {
    HEADING_ZERO_OFFSET_DEG
}

fn default_northing_offset() -> f64 {
    MAP_NORTHING_OFFSET_M
}

/// Constant status values published every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "default_ins_status_type")]
    pub ins_status_type: InsStatusType,

    #[serde(default = "default_measurement_time")]
    pub gnss_best_pose_measurement_time: f64,

    #[serde(default = "default_chassis_gear")]
    pub chassis_gear: GearPosition,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            ins_status_type: default_ins_status_type(),
            gnss_best_pose_measurement_time: default_measurement_time(),
            chassis_gear: default_chassis_gear(),
        }
    }
}

fn default_ins_status_type() -> InsStatusType {
    InsStatusType::Good
}

fn default_measurement_time() -> f64 {
    3.0
}

fn default_chassis_gear() -> GearPosition {
    GearPosition::Drive
}

/// Per-channel output routing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Which channel this routes
    pub channel: OutputChannel,

    /// Topic override (defaults to the channel's Apollo topic)
    #[serde(default)]
    pub topic: Option<String>,

    /// Sink type
    #[serde(default)]
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl OutputConfig {
    /// Log-sink route on the channel's default topic
    pub fn log(channel: OutputChannel) -> Self {
        Self {
            channel,
            topic: None,
            sink_type: SinkType::Log,
            queue_capacity: default_queue_capacity(),
            params: HashMap::new(),
        }
    }

    /// Effective topic name
    pub fn topic_name(&self) -> &str {
        self.topic
            .as_deref()
            .unwrap_or_else(|| self.channel.default_topic())
    }
}

fn default_queue_capacity() -> usize {
    1
}

/// Sink type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log output
    #[default]
    Log,
    /// JSON Lines file output
    File,
    /// Network output (UDP)
    Network,
}
