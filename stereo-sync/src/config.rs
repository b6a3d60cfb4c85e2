//! Configuration for the stereo-sync daemon
//!
//! Loaded from a TOML file. Every section and field has a default, so an empty
//! file (or no file at all) yields the stock MiRo stereo setup.

use crate::error::{Error, Result};
use crate::streaming::WireFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub topics: TopicConfig,
    #[serde(default)]
    pub frames: FrameConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub odometry: OdometryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// TCP endpoints and wire settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address producers connect to when sending raw streams
    pub inbound_address: String,
    /// Address subscribers connect to for relayed streams
    pub publish_address: String,
    /// Payload encoding for both directions
    pub wire_format: WireFormat,
    /// Outbound queue depth before the oldest message is dropped
    pub queue_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            inbound_address: "0.0.0.0:5560".to_string(),
            publish_address: "0.0.0.0:5561".to_string(),
            wire_format: WireFormat::Json,
            queue_capacity: 256,
        }
    }
}

/// Topic names for every inbound and outbound stream
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TopicConfig {
    pub left_image_in: String,
    pub right_image_in: String,
    pub left_camera_info_in: String,
    pub right_camera_info_in: String,
    pub velocity_in: String,

    pub left_image_out: String,
    pub right_image_out: String,
    pub left_camera_info_out: String,
    pub right_camera_info_out: String,
    pub odometry_out: String,
    pub tf_out: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            left_image_in: "/miro_scaledimage/left/image_raw".to_string(),
            right_image_in: "/miro_scaledimage/right/image_raw".to_string(),
            left_camera_info_in: "/yaml/left/camera_info".to_string(),
            right_camera_info_in: "/yaml/right/camera_info".to_string(),
            velocity_in: "/odom/miro".to_string(),

            left_image_out: "/stereo/left/image_raw".to_string(),
            right_image_out: "/stereo/right/image_raw".to_string(),
            left_camera_info_out: "/stereo/left/camera_info".to_string(),
            right_camera_info_out: "/stereo/right/camera_info".to_string(),
            odometry_out: "/stereo/odom".to_string(),
            tf_out: "/tf".to_string(),
        }
    }
}

/// Coordinate frame labels
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Fixed world frame
    pub map: String,
    /// Robot body frame (child of `map`)
    pub body: String,
    /// Sensor mount point on the robot head
    pub mount: String,
    /// Stereo sensor frame (child of `mount`)
    pub sensor: String,
    /// Label stamped on both relayed images
    pub image: String,
    /// Label stamped on the right camera info
    pub right_camera_info: String,
    /// Label stamped on the left camera info
    pub left_camera_info: String,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            map: "map".to_string(),
            body: "miro_robot__miro_body__body".to_string(),
            mount: "miro_robot__miro_head__eyelid_lh".to_string(),
            sensor: "stereo".to_string(),
            image: "stereo".to_string(),
            // Left and right camera info are labeled asymmetrically
            right_camera_info: "right".to_string(),
            left_camera_info: "stereo".to_string(),
        }
    }
}

/// Where a relayed timestamp comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StampSource {
    /// Stamp carried in the inbound message header
    #[default]
    Message,
    /// Wall-clock time at which the relay received the message
    Receipt,
}

/// Canonical timestamp selection
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Source of the canonical instant taken from each right image
    pub reference_stamp: StampSource,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reference_stamp: StampSource::Receipt,
        }
    }
}

/// Dead-reckoning and transform constants
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OdometryConfig {
    /// Divisor converting raw `linear.x` into m/s
    pub velocity_scale: f64,
    /// Heading at startup (radians); also the yaw of the sensor mount
    pub initial_heading: f64,
    /// Roll of the sensor mount relative to `mount` (radians)
    pub mount_roll: f64,
    /// Pitch of the sensor mount relative to `mount` (radians)
    pub mount_pitch: f64,
    /// Height at which the relayed odometry is placed (meters)
    pub odometry_height: f64,
    /// Source of the integration timestamp for velocity samples
    pub stamp_source: StampSource,
}

impl Default for OdometryConfig {
    fn default() -> Self {
        Self {
            velocity_scale: 230.0,
            initial_heading: 1.57 - 1.57 / 4.0,
            mount_roll: 1.57,
            mount_pitch: 3.14,
            odometry_height: 0.25,
            stamp_source: StampSource::Message,
        }
    }
}

impl OdometryConfig {
    /// Check the constants that feed the integrator and the emitted transforms.
    pub fn validate(&self) -> Result<()> {
        if !self.velocity_scale.is_finite() || self.velocity_scale <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "odometry.velocity_scale must be finite and positive, got {}",
                self.velocity_scale
            )));
        }

        let constants = [
            ("initial_heading", self.initial_heading),
            ("mount_roll", self.mount_roll),
            ("mount_pitch", self.mount_pitch),
            ("odometry_height", self.odometry_height),
        ];
        for (name, value) in constants {
            if !value.is_finite() {
                return Err(Error::InvalidParameter(format!(
                    "odometry.{} must be finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    ///
    /// # Example
    /// ```no_run
    /// use stereo_sync::config::AppConfig;
    ///
    /// let config = AppConfig::from_file("stereo-sync.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot drive the relay.
    pub fn validate(&self) -> Result<()> {
        if self.network.queue_capacity == 0 {
            return Err(Error::InvalidParameter(
                "network.queue_capacity must be at least 1".to_string(),
            ));
        }
        self.odometry.validate()
    }

    /// Load from `path`, falling back to defaults if the file does not exist.
    ///
    /// A file that exists but fails to parse is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            log::warn!("Config {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }
}
