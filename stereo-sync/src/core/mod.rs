//! Core data model shared by the relay and its consumers.
//!
//! - [`types`]: Message records (headers, images, camera info, transforms, odometry)
//! - [`pose`]: Dead-reckoned planar pose
//! - [`math`]: Quaternion conversions

pub mod math;
pub mod pose;
pub mod types;
