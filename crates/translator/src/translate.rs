//! Translator - VehicleState to Apollo pose

use contracts::{
    ApolloQuaternion, EulerAngles, FrameConfig, Point3D, PointEnu, Pose, VehicleState,
};

use crate::{decode_state, euler_to_quaternion, quaternion_to_euler, DecodeError};

/// Translation result for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseFix {
    /// Apollo-frame pose
    pub pose: Pose,

    /// Apollo-frame Euler angles (degrees), heading offset applied
    pub euler: EulerAngles,

    /// Input timestamp, unmodified
    pub timestamp_sec: f64,
}

/// Pure simulator-to-Apollo translator
#[derive(Debug, Clone, Copy, Default)]
pub struct Translator {
    frames: FrameConfig,
}

impl Translator {
    /// Create a translator with the given frame reconciliation constants
    pub fn new(frames: FrameConfig) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &FrameConfig {
        &self.frames
    }

    /// Translate one decoded state
    pub fn translate(&self, state: &VehicleState) -> PoseFix {
        let mut euler = quaternion_to_euler(state.orientation);
        euler.yaw -= self.frames.heading_offset_deg;
        let orientation = ApolloQuaternion::from(euler_to_quaternion(euler));

        let angular_velocity = Point3D::from(state.angular_velocity);
        let linear_acceleration = Point3D::from(state.linear_acceleration);

        let pose = Pose {
            position: PointEnu {
                x: state.position.x,
                y: state.position.y + self.frames.northing_offset_m,
                z: state.position.z,
            },
            orientation,
            linear_velocity: Point3D::from(state.linear_velocity),
            linear_acceleration,
            angular_velocity,
            linear_acceleration_vrf: linear_acceleration,
            angular_velocity_vrf: angular_velocity,
        };

        PoseFix {
            pose,
            euler,
            timestamp_sec: state.timestamp,
        }
    }

    /// Decode a state line and translate it
    pub fn decode_and_translate(
        &self,
        payload: &str,
    ) -> Result<(VehicleState, PoseFix), DecodeError> {
        let state = decode_state(payload)?;
        let fix = self.translate(&state);
        Ok((state, fix))
    }
}
