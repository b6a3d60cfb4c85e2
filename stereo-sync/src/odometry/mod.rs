//! Pose integration and transform emission.
//!
//! - [`PoseIntegrator`]: dead-reckons a planar pose from velocity samples
//! - [`TransformEmitter`]: derives the map→body and mount→sensor transforms
//!   plus the republished odometry record

mod emitter;
mod integrator;

pub use emitter::{Emission, TransformEmitter};
pub use integrator::{IntegrationStep, IntegratorConfig, PoseIntegrator};

use crate::config::OdometryConfig;

impl From<&OdometryConfig> for IntegratorConfig {
    fn from(config: &OdometryConfig) -> Self {
        Self {
            velocity_scale: config.velocity_scale,
            initial_heading: config.initial_heading,
        }
    }
}
