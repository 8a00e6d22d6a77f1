//! VehicleState - simulator side input
//!
//! The player-vehicle state broadcast by the simulator once per tick.

use serde::{Deserialize, Serialize};

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation quaternion (x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Roll / pitch / yaw triple, degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EulerAngles {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

/// Decoded simulator state record
///
/// Wire layout is a single line of whitespace-separated numbers:
///
/// | idx | field |
/// |---|---|
/// | 0-2 | position x, y, z (simulator world frame) |
/// | 3-6 | orientation quaternion x, y, z, w |
/// | 7-9 | angular velocity x, y, z (body frame) |
/// | 10-12 | linear velocity x, y, z (body frame) |
/// | 13-15 | linear acceleration x, y, z (body frame) |
/// | 16 | forward speed |
/// | 17 | timestamp (seconds) |
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Vector3,
    pub orientation: Quaternion,
    pub angular_velocity: Vector3,
    pub linear_velocity: Vector3,
    pub linear_acceleration: Vector3,
    /// Scalar forward speed (m/s)
    pub forward_speed: f64,
    /// Simulation timestamp (seconds)
    pub timestamp: f64,
}

impl VehicleState {
    /// Number of tokens in one state line
    pub const FIELD_COUNT: usize = 18;

    /// Field names in wire order (used in decode diagnostics)
    pub const FIELD_NAMES: [&'static str; Self::FIELD_COUNT] = [
        "position.x",
        "position.y",
        "position.z",
        "orientation.x",
        "orientation.y",
        "orientation.z",
        "orientation.w",
        "angular_velocity.x",
        "angular_velocity.y",
        "angular_velocity.z",
        "linear_velocity.x",
        "linear_velocity.y",
        "linear_velocity.z",
        "linear_acceleration.x",
        "linear_acceleration.y",
        "linear_acceleration.z",
        "forward_speed",
        "timestamp",
    ];

    /// Build from the 18 values in wire order
    pub fn from_fields(f: [f64; Self::FIELD_COUNT]) -> Self {
        Self {
            position: Vector3::new(f[0], f[1], f[2]),
            orientation: Quaternion::new(f[3], f[4], f[5], f[6]),
            angular_velocity: Vector3::new(f[7], f[8], f[9]),
            linear_velocity: Vector3::new(f[10], f[11], f[12]),
            linear_acceleration: Vector3::new(f[13], f[14], f[15]),
            forward_speed: f[16],
            timestamp: f[17],
        }
    }

    /// Values in wire order
    pub fn to_fields(&self) -> [f64; Self::FIELD_COUNT] {
        let p = self.position;
        let q = self.orientation;
        let w = self.angular_velocity;
        let v = self.linear_velocity;
        let a = self.linear_acceleration;
        [
            p.x,
            p.y,
            p.z,
            q.x,
            q.y,
            q.z,
            q.w,
            w.x,
            w.y,
            w.z,
            v.x,
            v.y,
            v.z,
            a.x,
            a.y,
            a.z,
            self.forward_speed,
            self.timestamp,
        ]
    }

    /// Render the wire line
    pub fn to_line(&self) -> String {
        self.to_fields()
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One inbound delivery on the state topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMessage {
    /// Topic the payload arrived on
    pub topic: String,

    /// Delivery sequence number assigned by the source
    pub sequence: u64,

    /// Raw text payload
    pub payload: String,
}
