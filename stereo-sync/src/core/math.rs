//! Rotation helpers.

use crate::core::types::Quaternion;
use nalgebra::UnitQuaternion;

/// Quaternion for fixed-axis roll, pitch, yaw (radians).
///
/// Rotations are applied roll about X, then pitch about Y, then yaw about Z,
/// matching `tf::createQuaternionFromRPY`.
#[inline]
pub fn quaternion_from_rpy(roll: f64, pitch: f64, yaw: f64) -> Quaternion {
    let q = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
    Quaternion {
        x: q.i,
        y: q.j,
        z: q.k,
        w: q.w,
    }
}

/// Quaternion for a pure rotation about Z.
#[inline]
pub fn quaternion_from_yaw(yaw: f64) -> Quaternion {
    quaternion_from_rpy(0.0, 0.0, yaw)
}

/// Recover (roll, pitch, yaw) from a quaternion.
pub fn rpy_from_quaternion(q: &Quaternion) -> (f64, f64, f64) {
    UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(q.w, q.x, q.y, q.z)).euler_angles()
}
