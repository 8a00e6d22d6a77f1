//! Apollo-side records
//!
//! Structured mirrors of the Apollo localization / drivers / canbus messages
//! the bridge populates. Wire encoding is the transport's concern.

use serde::{Deserialize, Serialize};

/// Message header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Simulation time of the data (seconds). Constant status records
    /// carry `None`.
    pub timestamp_sec: Option<f64>,

    /// Producing module
    #[serde(default)]
    pub module_name: String,
}

impl Header {
    pub fn stamped(timestamp_sec: f64, module_name: impl Into<String>) -> Self {
        Self {
            timestamp_sec: Some(timestamp_sec),
            module_name: module_name.into(),
        }
    }

    pub fn unstamped(module_name: impl Into<String>) -> Self {
        Self {
            timestamp_sec: None,
            module_name: module_name.into(),
        }
    }
}

/// East-North-Up point (map frame)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointEnu {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Generic 3D point / vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<crate::Vector3> for Point3D {
    fn from(v: crate::Vector3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// Apollo quaternion (qx, qy, qz, qw)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApolloQuaternion {
    pub qx: f64,
    pub qy: f64,
    pub qz: f64,
    pub qw: f64,
}

impl Default for ApolloQuaternion {
    fn default() -> Self {
        Self {
            qx: 0.0,
            qy: 0.0,
            qz: 0.0,
            qw: 1.0,
        }
    }
}

impl From<crate::Quaternion> for ApolloQuaternion {
    fn from(q: crate::Quaternion) -> Self {
        Self {
            qx: q.x,
            qy: q.y,
            qz: q.z,
            qw: q.w,
        }
    }
}

impl From<ApolloQuaternion> for crate::Quaternion {
    fn from(q: ApolloQuaternion) -> Self {
        Self::new(q.qx, q.qy, q.qz, q.qw)
    }
}

/// Localization pose
///
/// Angular velocity and linear acceleration appear twice: once in the
/// vehicle reference frame (`*_vrf`) and once in the generic slot. The
/// bridge fills both with the same body-frame values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: PointEnu,
    pub orientation: ApolloQuaternion,
    pub linear_velocity: Point3D,
    pub linear_acceleration: Point3D,
    pub angular_velocity: Point3D,
    pub linear_acceleration_vrf: Point3D,
    pub angular_velocity_vrf: Point3D,
}

/// GNSS odometry fix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Gps {
    pub header: Header,
    pub localization: Pose,
}

/// Corrected inertial measurement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectedImu {
    pub header: Header,
    pub imu: Pose,
}

/// GNSS receiver status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GnssStatus {
    pub header: Header,
    pub solution_completed: bool,
}

/// INS solution status type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsStatusType {
    #[default]
    Invalid,
    Converging,
    Good,
}

impl InsStatusType {
    /// Numeric code on the Apollo wire
    pub fn code(self) -> i32 {
        match self {
            Self::Invalid => 0,
            Self::Converging => 1,
            Self::Good => 2,
        }
    }
}

/// INS status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsStatus {
    pub header: Header,
    pub status_type: InsStatusType,
}

/// GNSS best position
///
/// Only `measurement_time` is populated, as a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GnssBestPose {
    pub header: Header,
    pub measurement_time: f64,
}

/// Gear position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearPosition {
    #[default]
    Neutral,
    Drive,
    Reverse,
    Parking,
}

impl GearPosition {
    /// Numeric code on the Apollo wire
    pub fn code(self) -> i32 {
        match self {
            Self::Neutral => 0,
            Self::Drive => 1,
            Self::Reverse => 2,
            Self::Parking => 3,
        }
    }
}

/// Driving mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrivingMode {
    #[default]
    CompleteManual,
    CompleteAutoDrive,
    AutoSteerOnly,
    AutoSpeedOnly,
    EmergencyMode,
}

/// Vehicle chassis report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chassis {
    pub header: Header,
    pub engine_started: bool,
    pub speed_mps: f64,
    pub throttle_percentage: f64,
    pub brake_percentage: f64,
    pub steering_percentage: f64,
    pub gear_location: GearPosition,
    pub driving_mode: DrivingMode,
}
