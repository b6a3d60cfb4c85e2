//! stereo-sync - stereo stream synchronization for the MiRo robot
//!
//! Relays the robot's raw stereo streams with consistent frame labels and a
//! shared timestamp, and dead-reckons the body pose from velocity messages to
//! publish the transforms a stereo pipeline needs.
//!
//! ## Modules
//!
//! - [`sync`]: canonical timestamp cell and header relabeling
//! - [`odometry`]: pose integration and transform emission
//! - [`streaming`]: TCP framing, publisher and receiver
//! - [`relay`]: composition of the above

pub mod config;
pub mod core;
pub mod error;
pub mod odometry;
pub mod relay;
pub mod streaming;
pub mod sync;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
pub use relay::{RelayService, StereoRelay};
