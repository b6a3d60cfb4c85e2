//! Transform and odometry construction from the integrated pose.
//!
//! Two chained transforms are produced per pose update:
//!
//! ```text
//! map ──(x, y, yaw=heading)──▶ body
//! mount ──(0, 0, rpy=mount)──▶ sensor
//! ```
//!
//! The second transform is the fixed mechanical angle of the stereo pair on
//! the robot head, so it never depends on the live pose.

use crate::config::{FrameConfig, OdometryConfig};
use crate::core::math::{quaternion_from_rpy, quaternion_from_yaw};
use crate::core::pose::Pose2D;
use crate::core::types::{
    Header, OdometryRecord, Pose3D, Quaternion, TransformRecord, Twist, Vector3,
};

/// Everything published for one pose update.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    /// Robot body in the fixed map frame
    pub body: TransformRecord,
    /// Stereo sensor relative to its mount point
    pub mount: TransformRecord,
    /// Odometry for visualization
    pub odometry: OdometryRecord,
}

/// Builds transforms and odometry records.
#[derive(Debug, Clone)]
pub struct TransformEmitter {
    frames: FrameConfig,
    mount_rotation: Quaternion,
    odometry_height: f64,
}

impl TransformEmitter {
    pub fn new(frames: FrameConfig, odometry: &OdometryConfig) -> Self {
        let mount_rotation = quaternion_from_rpy(
            odometry.mount_roll,
            odometry.mount_pitch,
            odometry.initial_heading,
        );

        Self {
            frames,
            mount_rotation,
            odometry_height: odometry.odometry_height,
        }
    }

    /// Transforms and odometry for `pose` at `stamp_us`.
    ///
    /// `twist` is echoed unchanged on the odometry record.
    pub fn emit(&self, pose: &Pose2D, stamp_us: u64, twist: Twist) -> Emission {
        Emission {
            body: self.body_transform(pose, stamp_us),
            mount: self.mount_transform(stamp_us),
            odometry: self.odometry(stamp_us, twist),
        }
    }

    /// Robot body pose in the map frame.
    pub fn body_transform(&self, pose: &Pose2D, stamp_us: u64) -> TransformRecord {
        TransformRecord {
            parent_frame: self.frames.map.clone(),
            child_frame: self.frames.body.clone(),
            stamp_us,
            translation: Vector3::new(pose.x, pose.y, 0.0),
            rotation: quaternion_from_yaw(pose.heading),
        }
    }

    /// Static sensor mount offset.
    pub fn mount_transform(&self, stamp_us: u64) -> TransformRecord {
        TransformRecord {
            parent_frame: self.frames.mount.clone(),
            child_frame: self.frames.sensor.clone(),
            stamp_us,
            translation: Vector3::zero(),
            rotation: self.mount_rotation,
        }
    }

    /// Odometry pinned at a fixed height with the mount orientation.
    ///
    /// Position does not follow the integrated x/y; only the frame labels and
    /// stamp change between updates.
    pub fn odometry(&self, stamp_us: u64, twist: Twist) -> OdometryRecord {
        OdometryRecord {
            header: Header::new(stamp_us, self.frames.map.as_str()),
            child_frame_id: self.frames.sensor.clone(),
            pose: Pose3D {
                position: Vector3::new(0.0, 0.0, self.odometry_height),
                orientation: self.mount_rotation,
            },
            twist,
        }
    }

    /// Rotation of the sensor relative to its mount.
    pub fn mount_rotation(&self) -> Quaternion {
        self.mount_rotation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::rpy_from_quaternion;
    use approx::assert_relative_eq;

    fn emitter() -> TransformEmitter {
        TransformEmitter::new(FrameConfig::default(), &OdometryConfig::default())
    }

    #[test]
    fn test_body_transform_follows_pose() {
        let pose = Pose2D::new(1.5, -2.0, 0.7);
        let tf = emitter().body_transform(&pose, 99);

        assert_eq!(tf.parent_frame, "map");
        assert_eq!(tf.child_frame, "miro_robot__miro_body__body");
        assert_eq!(tf.stamp_us, 99);
        assert_eq!(tf.translation, Vector3::new(1.5, -2.0, 0.0));

        let (roll, pitch, yaw) = rpy_from_quaternion(&tf.rotation);
        assert_relative_eq!(roll, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pitch, 0.0, epsilon = 1e-12);
        assert_relative_eq!(yaw, 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_body_rotation_ignores_initial_heading() {
        let mut odom = OdometryConfig::default();
        odom.initial_heading = 2.5;
        let emitter = TransformEmitter::new(FrameConfig::default(), &odom);

        let tf = emitter.body_transform(&Pose2D::facing(0.0), 0);
        assert_eq!(tf.rotation, Quaternion::identity());
    }

    #[test]
    fn test_mount_transform_is_static() {
        let emitter = emitter();
        let a = emitter.emit(&Pose2D::new(0.0, 0.0, 0.0), 10, Twist::default());
        let b = emitter.emit(&Pose2D::new(5.0, 3.0, 40.0), 20, Twist::default());

        assert_eq!(a.mount.translation, Vector3::zero());
        assert_eq!(a.mount.translation, b.mount.translation);
        assert_eq!(a.mount.rotation, b.mount.rotation);
        assert_eq!(a.mount.parent_frame, "miro_robot__miro_head__eyelid_lh");
        assert_eq!(a.mount.child_frame, "stereo");
    }

    #[test]
    fn test_mount_rotation_matches_constants() {
        let expected = quaternion_from_rpy(1.57, 3.14, 1.57 - 1.57 / 4.0);
        assert_eq!(emitter().mount_rotation(), expected);
    }

    #[test]
    fn test_odometry_fixed_position() {
        let twist = Twist {
            linear: Vector3::new(120.0, 0.0, 0.0),
            angular: Vector3::new(0.0, 0.0, 0.3),
        };
        let emission = emitter().emit(&Pose2D::new(4.0, 4.0, 1.0), 1_000, twist);
        let odom = &emission.odometry;

        assert_eq!(odom.pose.position, Vector3::new(0.0, 0.0, 0.25));
        assert_eq!(odom.pose.orientation, emission.mount.rotation);
        assert_eq!(odom.header.frame_id, "map");
        assert_eq!(odom.header.stamp_us, 1_000);
        assert_eq!(odom.child_frame_id, "stereo");
        assert_eq!(odom.twist, twist);
    }

    #[test]
    fn test_all_records_share_stamp() {
        let emission = emitter().emit(&Pose2D::default(), 555, Twist::default());
        assert_eq!(emission.body.stamp_us, 555);
        assert_eq!(emission.mount.stamp_us, 555);
        assert_eq!(emission.odometry.header.stamp_us, 555);
    }
}
