//! OutboundMessage - what sinks receive
//!
//! Wraps one Apollo record with its routing metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Chassis, CorrectedImu, GnssBestPose, GnssStatus, Gps, InsStatus};

/// Any record the bridge can publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApolloMessage {
    Gps(Gps),
    CorrectedImu(CorrectedImu),
    GnssStatus(GnssStatus),
    InsStatus(InsStatus),
    GnssBestPose(GnssBestPose),
    Chassis(Chassis),
}

impl ApolloMessage {
    /// Short kind name (used for logging/metrics)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Gps(_) => "gps",
            Self::CorrectedImu(_) => "corrected_imu",
            Self::GnssStatus(_) => "gnss_status",
            Self::InsStatus(_) => "ins_status",
            Self::GnssBestPose(_) => "gnss_best_pose",
            Self::Chassis(_) => "chassis",
        }
    }

    /// Header timestamp, if the record carries one
    pub fn timestamp_sec(&self) -> Option<f64> {
        match self {
            Self::Gps(m) => m.header.timestamp_sec,
            Self::CorrectedImu(m) => m.header.timestamp_sec,
            Self::GnssStatus(m) => m.header.timestamp_sec,
            Self::InsStatus(m) => m.header.timestamp_sec,
            Self::GnssBestPose(m) => m.header.timestamp_sec,
            Self::Chassis(m) => m.header.timestamp_sec,
        }
    }
}

macro_rules! impl_into_apollo_message {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for ApolloMessage {
                fn from(message: $ty) -> Self {
                    Self::$ty(message)
                }
            }
        )*
    };
}

impl_into_apollo_message!(Gps, CorrectedImu, GnssStatus, InsStatus, GnssBestPose, Chassis);

/// Routed message handed to a sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Destination topic
    pub topic: String,

    /// Per-topic sequence number (monotonically increasing)
    pub sequence: u64,

    /// Wall-clock publish time
    pub published_at: DateTime<Utc>,

    /// Payload record
    pub message: ApolloMessage,
}

/// The six outbound channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputChannel {
    GpsOdometry,
    CorrectedImu,
    GnssStatus,
    InsStatus,
    GnssBestPose,
    Chassis,
}

impl OutputChannel {
    pub const ALL: [Self; 6] = [
        Self::GpsOdometry,
        Self::CorrectedImu,
        Self::GnssStatus,
        Self::InsStatus,
        Self::GnssBestPose,
        Self::Chassis,
    ];

    /// Apollo topic this channel publishes on unless overridden
    pub fn default_topic(self) -> &'static str {
        match self {
            Self::GpsOdometry => "/apollo/sensor/gnss/odometry",
            Self::CorrectedImu => "/apollo/sensor/gnss/corrected_imu",
            Self::GnssStatus => "/apollo/sensor/gnss/gnss_status",
            Self::InsStatus => "/apollo/sensor/gnss/ins_status",
            Self::GnssBestPose => "/apollo/sensor/gnss/best_pose",
            Self::Chassis => "/apollo/canbus/chassis",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GpsOdometry => "gps_odometry",
            Self::CorrectedImu => "corrected_imu",
            Self::GnssStatus => "gnss_status",
            Self::InsStatus => "ins_status",
            Self::GnssBestPose => "gnss_best_pose",
            Self::Chassis => "chassis",
        }
    }
}

impl std::fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
