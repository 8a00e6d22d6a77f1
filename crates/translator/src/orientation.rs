//! Quaternion <-> Euler conversion
//!
//! Angles are degrees. Euler angles are roll about x, pitch about y, yaw
//! about z, composed about the static axes in that order
//! (q = Rz(yaw) * Ry(pitch) * Rx(roll)).

use contracts::{EulerAngles, Quaternion};
use nalgebra::UnitQuaternion;

/// Quaternion to roll/pitch/yaw
///
/// The asin argument is clamped to [-1, 1]; round-off on a near-vertical
/// pitch would otherwise push it out of domain and yield NaN.
pub fn quaternion_to_euler(q: Quaternion) -> EulerAngles {
    let Quaternion { x, y, z, w } = q;

    let roll = f64::atan2(2.0 * (w * x + y * z), 1.0 - 2.0 * (x * x + y * y));

    let sin_pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0);
    let pitch = sin_pitch.asin();

    let yaw = f64::atan2(2.0 * (w * z + x * y), 1.0 - 2.0 * (y * y + z * z));

    EulerAngles {
        roll: roll.to_degrees(),
        pitch: pitch.to_degrees(),
        yaw: yaw.to_degrees(),
    }
}

/// Roll/pitch/yaw to quaternion
pub fn euler_to_quaternion(angles: EulerAngles) -> Quaternion {
    let rotation = UnitQuaternion::from_euler_angles(
        angles.roll.to_radians(),
        angles.pitch.to_radians(),
        angles.yaw.to_radians(),
    );
    let q = rotation.into_inner();
    Quaternion::new(q.i, q.j, q.k, q.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn euler(roll: f64, pitch: f64, yaw: f64) -> EulerAngles {
        EulerAngles { roll, pitch, yaw }
    }

    #[test]
    fn test_identity() {
        let e = quaternion_to_euler(Quaternion::IDENTITY);
        assert_eq!(e, euler(0.0, 0.0, 0.0));

        let q = euler_to_quaternion(euler(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(q.w, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(q.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pure_yaw() {
        let half = 45.0_f64.to_radians();
        let q = Quaternion::new(0.0, 0.0, half.sin(), half.cos());
        let e = quaternion_to_euler(q);
        assert_abs_diff_eq!(e.yaw, 90.0, epsilon = 1e-9);
        assert_abs_diff_eq!(e.roll, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(e.pitch, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip_angles() {
        for &(r, p, y) in &[
            (10.0, -20.0, 30.0),
            (-170.0, 45.0, 120.0),
            (0.5, 89.0, -179.0),
            (33.3, -60.0, 0.0),
        ] {
            let e = quaternion_to_euler(euler_to_quaternion(euler(r, p, y)));
            assert_abs_diff_eq!(e.roll, r, epsilon = 1e-6);
            assert_abs_diff_eq!(e.pitch, p, epsilon = 1e-6);
            assert_abs_diff_eq!(e.yaw, y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_static_xyz_composition() {
        // roll 90 then yaw 90 about the static axes maps body y onto world z
        let q = euler_to_quaternion(euler(90.0, 0.0, 90.0));
        let rotation = UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(q.w, q.x, q.y, q.z));
        let mapped = rotation * nalgebra::Vector3::y();
        assert_abs_diff_eq!(mapped.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_pitch_argument_above_domain_is_clamped() {
        // 2(wy - zx) = 1.0000001
        let s = (1.000_000_1_f64 / 2.0).sqrt();
        let e = quaternion_to_euler(Quaternion::new(0.0, s, 0.0, s));
        assert!(e.pitch.is_finite());
        assert_abs_diff_eq!(e.pitch, 90.0, epsilon = 1e-9);
        assert!(e.roll.is_finite());
        assert!(e.yaw.is_finite());
    }

    #[test]
    fn test_pitch_argument_below_domain_is_clamped() {
        // 2(wy - zx) = -1.0000001
        let s = (1.000_000_1_f64 / 2.0).sqrt();
        let e = quaternion_to_euler(Quaternion::new(0.0, -s, 0.0, s));
        assert!(e.pitch.is_finite());
        assert_abs_diff_eq!(e.pitch, -90.0, epsilon = 1e-9);
    }
}
