//! Message records relayed by stereo-sync.
//!
//! The shapes follow the ROS `std_msgs`, `sensor_msgs`, `geometry_msgs` and
//! `nav_msgs` definitions closely enough that a bridge can map them field by
//! field. Only [`Header`] is ever modified by the relay; payload fields pass
//! through untouched.
//!
//! All timestamps are microseconds since the Unix epoch.

use serde::{Deserialize, Serialize};

/// Message header carried by every stamped record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Header {
    /// Sequence number assigned by the producer
    #[serde(default)]
    pub seq: u32,
    /// Timestamp in microseconds since epoch
    #[serde(default)]
    pub stamp_us: u64,
    /// Coordinate frame the data is expressed in
    #[serde(default)]
    pub frame_id: String,
}

impl Header {
    /// Create a header with the given stamp and frame.
    pub fn new(stamp_us: u64, frame_id: impl Into<String>) -> Self {
        Self {
            seq: 0,
            stamp_us,
            frame_id: frame_id.into(),
        }
    }
}

/// Records that carry a [`Header`].
pub trait Stamped {
    fn header(&self) -> &Header;
    fn header_mut(&mut self) -> &mut Header;
}

/// Raw camera image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Image {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    /// Pixel encoding (e.g. "rgb8", "mono8")
    pub encoding: String,
    pub is_bigendian: u8,
    /// Row length in bytes
    pub step: u32,
    pub data: Vec<u8>,
}

/// Region of interest within a camera image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub x_offset: u32,
    pub y_offset: u32,
    pub height: u32,
    pub width: u32,
    pub do_rectify: bool,
}

/// Camera calibration for one camera of the stereo pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraInfo {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub distortion_model: String,
    /// Distortion coefficients
    pub d: Vec<f64>,
    /// Intrinsic matrix, row-major 3x3
    pub k: [f64; 9],
    /// Rectification matrix, row-major 3x3
    pub r: [f64; 9],
    /// Projection matrix, row-major 3x4
    pub p: [f64; 12],
    pub binning_x: u32,
    pub binning_y: u32,
    pub roi: RegionOfInterest,
}

impl Stamped for Image {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }
}

impl Stamped for CameraInfo {
    fn header(&self) -> &Header {
        &self.header
    }

    fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }
}

/// Vector in free space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn zero() -> Self {
        Self::default()
    }
}

/// Orientation in quaternion form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Quaternion {
    #[inline]
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

/// Linear and angular velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

/// Velocity message published by the robot's odometry source.
///
/// Only `twist.linear.x`, `twist.angular.z` and the header stamp feed the
/// integrator; the full twist is echoed on the republished odometry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VelocityMessage {
    pub header: Header,
    pub twist: Twist,
}

/// One velocity measurement consumed by the pose integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocitySample {
    /// Forward velocity in raw platform units
    pub linear_x: f64,
    /// Yaw rate in rad/s
    pub angular_z: f64,
    /// Timestamp in microseconds since epoch
    pub timestamp_us: u64,
}

impl VelocitySample {
    pub fn new(linear_x: f64, angular_z: f64, timestamp_us: u64) -> Self {
        Self {
            linear_x,
            angular_z,
            timestamp_us,
        }
    }
}

/// Rigid transform between two named frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub parent_frame: String,
    pub child_frame: String,
    pub stamp_us: u64,
    pub translation: Vector3,
    pub rotation: Quaternion,
}

/// Batch of transforms broadcast together on the TF topic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TfMessage {
    pub transforms: Vec<TransformRecord>,
}

/// Position and orientation in free space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose3D {
    pub position: Vector3,
    pub orientation: Quaternion,
}

/// Odometry republished for visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdometryRecord {
    pub header: Header,
    pub child_frame_id: String,
    pub pose: Pose3D,
    pub twist: Twist,
}

/// Current wall-clock time in microseconds since epoch.
#[inline]
pub fn now_us() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_defaults_when_fields_missing() {
        let header: Header = serde_json::from_str(r#"{"frame_id":"cam"}"#).unwrap();
        assert_eq!(header.seq, 0);
        assert_eq!(header.stamp_us, 0);
        assert_eq!(header.frame_id, "cam");
    }

    #[test]
    fn test_stamped_access() {
        let mut image = Image::default();
        image.header_mut().frame_id = "left".to_string();
        assert_eq!(image.header().frame_id, "left");
    }

    #[test]
    fn test_now_is_monotonic_enough() {
        let a = now_us();
        let b = now_us();
        assert!(a > 0);
        assert!(b >= a);
    }
}
