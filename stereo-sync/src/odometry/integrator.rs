//! Dead-reckoning from velocity samples.
//!
//! Integrates a planar pose from forward velocity and yaw rate in the robot's
//! current heading frame (first-order, no midpoint correction):
//!
//! ```text
//! vx = linear_x / velocity_scale      (0 while |angular_z| > 0)
//! x += (vx·cos θ − vy·sin θ)·dt
//! y += (vx·sin θ + vy·cos θ)·dt
//! θ += angular_z·dt                   (never wrapped)
//! ```
//!
//! The platform is non-holonomic so `vy` is always zero.

use crate::core::pose::Pose2D;
use crate::core::types::VelocitySample;
use crate::error::{Error, Result};

/// Configuration for the pose integrator.
#[derive(Debug, Clone, Copy)]
pub struct IntegratorConfig {
    /// Divisor converting raw forward velocity into m/s.
    ///
    /// The MiRo reports body speed in platform units; 230 units ≈ 1 m/s.
    pub velocity_scale: f64,

    /// Heading at startup in radians.
    pub initial_heading: f64,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            velocity_scale: 230.0,
            initial_heading: 1.57 - 1.57 / 4.0,
        }
    }
}

impl IntegratorConfig {
    /// Reject scales that would turn every sample into NaN.
    pub fn validate(&self) -> Result<()> {
        if !self.velocity_scale.is_finite() || self.velocity_scale <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "velocity_scale must be finite and positive, got {}",
                self.velocity_scale
            )));
        }
        if !self.initial_heading.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "initial_heading must be finite, got {}",
                self.initial_heading
            )));
        }
        Ok(())
    }
}

/// Result of integrating one velocity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationStep {
    /// Pose after the step
    pub pose: Pose2D,
    /// Elapsed time used for the step (seconds, never negative)
    pub dt: f64,
    /// Sample was older than the previous one; `dt` was clamped to zero
    pub clamped: bool,
    /// Sample carried a non-finite velocity; the pose was left unchanged
    pub rejected: bool,
    /// Forward motion was discarded because the base was rotating
    pub translation_suppressed: bool,
}

/// Stateful dead-reckoning engine.
///
/// # Rotation heuristic
///
/// Any non-zero yaw rate, however small, is treated as turning in place and
/// zeroes the forward velocity for that step.
#[derive(Debug)]
pub struct PoseIntegrator {
    config: IntegratorConfig,
    pose: Pose2D,
    last_update_us: u64,
    samples: u64,
    clamped_samples: u64,
    rejected_samples: u64,
}

impl PoseIntegrator {
    /// Create an integrator at the origin, facing the configured heading.
    ///
    /// `start_us` is the instant the first sample's `dt` is measured from.
    pub fn new(config: IntegratorConfig, start_us: u64) -> Result<Self> {
        config.validate()?;
        log::debug!(
            "PoseIntegrator: velocity_scale={:.1}, initial_heading={:.4}rad",
            config.velocity_scale,
            config.initial_heading
        );

        Ok(Self {
            pose: Pose2D::facing(config.initial_heading),
            config,
            last_update_us: start_us,
            samples: 0,
            clamped_samples: 0,
            rejected_samples: 0,
        })
    }

    /// Integrate one velocity sample into the pose.
    pub fn integrate(&mut self, sample: &VelocitySample) -> IntegrationStep {
        let clamped = sample.timestamp_us < self.last_update_us;
        let dt = if clamped {
            self.clamped_samples += 1;
            log::warn!(
                "PoseIntegrator: out-of-order sample ({}us < {}us), dt clamped to 0",
                sample.timestamp_us,
                self.last_update_us
            );
            0.0
        } else {
            (sample.timestamp_us - self.last_update_us) as f64 / 1_000_000.0
        };
        self.last_update_us = sample.timestamp_us;
        self.samples += 1;

        if !sample.linear_x.is_finite() || !sample.angular_z.is_finite() {
            self.rejected_samples += 1;
            log::warn!(
                "PoseIntegrator: non-finite velocity ({}, {}) at {}us, pose unchanged",
                sample.linear_x,
                sample.angular_z,
                sample.timestamp_us
            );
            return IntegrationStep {
                pose: self.pose,
                dt: 0.0,
                clamped,
                rejected: true,
                translation_suppressed: false,
            };
        }

        let vth = sample.angular_z;
        let translation_suppressed = vth.abs() > 0.0;
        let vx = if translation_suppressed {
            0.0
        } else {
            sample.linear_x / self.config.velocity_scale
        };
        let vy = 0.0;

        let (sin_h, cos_h) = self.pose.heading.sin_cos();
        let delta_x = (vx * cos_h - vy * sin_h) * dt;
        let delta_y = (vx * sin_h + vy * cos_h) * dt;
        let delta_heading = vth * dt;

        self.pose.x += delta_x;
        self.pose.y += delta_y;
        self.pose.heading += delta_heading;

        log::trace!(
            "PoseIntegrator: dt={:.4}s vx={:.3} vth={:.3} -> ({:.3}, {:.3}, {:.3})",
            dt,
            vx,
            vth,
            self.pose.x,
            self.pose.y,
            self.pose.heading
        );

        IntegrationStep {
            pose: self.pose,
            dt,
            clamped,
            rejected: false,
            translation_suppressed,
        }
    }

    /// Current pose estimate.
    pub fn pose(&self) -> Pose2D {
        self.pose
    }

    /// Number of samples integrated so far.
    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    /// Number of out-of-order samples whose `dt` was clamped.
    pub fn clamped_count(&self) -> u64 {
        self.clamped_samples
    }

    /// Number of samples discarded for carrying NaN or infinite velocities.
    pub fn rejected_count(&self) -> u64 {
        self.rejected_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SECOND: u64 = 1_000_000;

    fn integrator() -> PoseIntegrator {
        PoseIntegrator::new(IntegratorConfig::default(), 0).unwrap()
    }

    #[test]
    fn test_initial_pose() {
        let integ = integrator();
        let pose = integ.pose();
        assert_eq!(pose.x, 0.0);
        assert_eq!(pose.y, 0.0);
        assert_relative_eq!(pose.heading, 1.1775, epsilon = 1e-12);
    }

    #[test]
    fn test_straight_motion_along_heading() {
        let mut integ = integrator();
        let h0 = integ.pose().heading;

        let step = integ.integrate(&VelocitySample::new(230.0, 0.0, SECOND));

        assert!(!step.translation_suppressed);
        assert!(!step.clamped);
        assert_relative_eq!(step.dt, 1.0);
        assert_relative_eq!(step.pose.x, h0.cos(), epsilon = 1e-12);
        assert_relative_eq!(step.pose.y, h0.sin(), epsilon = 1e-12);
        assert_eq!(step.pose.heading, h0);
    }

    #[test]
    fn test_rotation_suppresses_translation() {
        let mut integ = integrator();
        let h0 = integ.pose().heading;

        let step = integ.integrate(&VelocitySample::new(500.0, 0.2, SECOND / 2));

        assert!(step.translation_suppressed);
        assert_eq!(step.pose.x, 0.0);
        assert_eq!(step.pose.y, 0.0);
        assert_relative_eq!(step.pose.heading, h0 + 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_tiny_rotation_still_suppresses() {
        let mut integ = integrator();
        let step = integ.integrate(&VelocitySample::new(230.0, -1e-9, SECOND));
        assert!(step.translation_suppressed);
        assert_eq!(step.pose.x, 0.0);
        assert_eq!(step.pose.y, 0.0);
    }

    #[test]
    fn test_uses_current_heading() {
        let config = IntegratorConfig {
            velocity_scale: 1.0,
            initial_heading: 0.0,
        };
        let mut integ = PoseIntegrator::new(config, 0).unwrap();

        // Quarter turn, then one meter forward
        integ.integrate(&VelocitySample::new(0.0, std::f64::consts::FRAC_PI_2, SECOND));
        let step = integ.integrate(&VelocitySample::new(1.0, 0.0, 2 * SECOND));

        assert_relative_eq!(step.pose.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(step.pose.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_heading_accumulates_past_pi() {
        let config = IntegratorConfig {
            velocity_scale: 230.0,
            initial_heading: 0.0,
        };
        let mut integ = PoseIntegrator::new(config, 0).unwrap();

        for i in 1..=10 {
            integ.integrate(&VelocitySample::new(0.0, 1.0, i * SECOND));
        }

        assert_relative_eq!(integ.pose().heading, 10.0, epsilon = 1e-9);
        assert_eq!(integ.sample_count(), 10);
    }

    #[test]
    fn test_out_of_order_sample_is_clamped() {
        let mut integ = integrator();
        integ.integrate(&VelocitySample::new(230.0, 0.0, 2 * SECOND));
        let before = integ.pose();

        let step = integ.integrate(&VelocitySample::new(230.0, 0.0, SECOND));

        assert!(step.clamped);
        assert_eq!(step.dt, 0.0);
        assert_eq!(step.pose, before);
        assert_eq!(integ.clamped_count(), 1);
        // The older stamp becomes the new reference
        let step = integ.integrate(&VelocitySample::new(0.0, 0.0, 2 * SECOND));
        assert_relative_eq!(step.dt, 1.0);
    }

    #[test]
    fn test_duplicate_timestamp_is_noop() {
        let mut integ = integrator();
        integ.integrate(&VelocitySample::new(230.0, 0.0, SECOND));
        let before = integ.pose();

        let step = integ.integrate(&VelocitySample::new(230.0, 0.5, SECOND));

        assert!(!step.clamped);
        assert_eq!(step.dt, 0.0);
        assert_eq!(step.pose, before);
    }

    #[test]
    fn test_dt_measured_from_construction() {
        let mut integ = PoseIntegrator::new(IntegratorConfig::default(), 10 * SECOND).unwrap();
        let step = integ.integrate(&VelocitySample::new(0.0, 0.0, 12 * SECOND));
        assert_relative_eq!(step.dt, 2.0);
    }

    #[test]
    fn test_non_finite_sample_leaves_pose_intact() {
        let mut integ = integrator();
        let before = integ.pose();

        let step = integ.integrate(&VelocitySample::new(0.0, f64::NAN, SECOND));
        assert!(step.rejected);
        assert_eq!(step.pose, before);

        let step = integ.integrate(&VelocitySample::new(f64::INFINITY, 0.0, 2 * SECOND));
        assert!(step.rejected);
        assert_eq!(integ.rejected_count(), 2);

        // A clean sample afterwards integrates over its own interval only
        let step = integ.integrate(&VelocitySample::new(230.0, 0.0, 3 * SECOND));
        assert!(!step.rejected);
        assert_relative_eq!(step.dt, 1.0);
        assert_relative_eq!(step.pose.x, before.heading.cos(), epsilon = 1e-12);
        assert_relative_eq!(step.pose.y, before.heading.sin(), epsilon = 1e-12);
        assert_eq!(step.pose.heading, before.heading);
    }

    #[test]
    fn test_rejects_bad_velocity_scale() {
        for scale in [0.0, -230.0, f64::NAN, f64::INFINITY] {
            let config = IntegratorConfig {
                velocity_scale: scale,
                ..Default::default()
            };
            assert!(matches!(
                PoseIntegrator::new(config, 0),
                Err(Error::InvalidParameter(_))
            ));
        }

        let config = IntegratorConfig {
            initial_heading: f64::NAN,
            ..Default::default()
        };
        assert!(PoseIntegrator::new(config, 0).is_err());
    }
}
