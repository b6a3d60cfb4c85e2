//! Planar robot pose.

use serde::{Deserialize, Serialize};

/// Robot pose in 2D space.
///
/// Position (x, y) in meters, heading in radians. Unlike a map-frame pose the
/// heading is **not** normalized: it accumulates every integrated rotation so
/// that consecutive samples never see a 2π discontinuity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position in meters
    pub x: f64,
    /// Y position in meters
    pub y: f64,
    /// Accumulated heading in radians
    pub heading: f64,
}

impl Pose2D {
    #[inline]
    pub fn new(x: f64, y: f64, heading: f64) -> Self {
        Self { x, y, heading }
    }

    /// Pose at the origin facing `heading`.
    #[inline]
    pub fn facing(heading: f64) -> Self {
        Self::new(0.0, 0.0, heading)
    }
}

impl Default for Pose2D {
    fn default() -> Self {
        Self::facing(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_heading_is_not_wrapped() {
        let pose = Pose2D::new(0.0, 0.0, 3.0 * PI);
        assert_relative_eq!(pose.heading, 3.0 * PI);
    }

    #[test]
    fn test_facing_starts_at_origin() {
        let pose = Pose2D::facing(1.0);
        assert_eq!(pose, Pose2D::new(0.0, 0.0, 1.0));
        assert_eq!(Pose2D::default().heading, 0.0);
    }
}
