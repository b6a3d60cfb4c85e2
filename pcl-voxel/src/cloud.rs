//! Colored point cloud records.

use serde::{Deserialize, Serialize};
use stereo_sync::core::types::Header;

/// Point with position in meters and 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointXyzRgb {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rgb: [u8; 3],
}

impl PointXyzRgb {
    #[inline]
    pub fn new(x: f32, y: f32, z: f32, rgb: [u8; 3]) -> Self {
        Self { x, y, z, rgb }
    }

    /// All coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Unordered point cloud.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointCloud {
    pub header: Header,
    pub points: Vec<PointXyzRgb>,
}

impl PointCloud {
    pub fn new(header: Header, points: Vec<PointXyzRgb>) -> Self {
        Self { header, points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
