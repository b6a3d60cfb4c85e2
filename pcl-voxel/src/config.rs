//! Configuration for the pcl-voxel daemon

use crate::error::Result;
use crate::voxel_grid::VoxelGridConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use stereo_sync::config::LoggingConfig;
use stereo_sync::streaming::WireFormat;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PclConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub topics: TopicConfig,
    #[serde(default)]
    pub filter: VoxelGridConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// TCP endpoints and wire settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub inbound_address: String,
    pub publish_address: String,
    pub wire_format: WireFormat,
    pub queue_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            inbound_address: "0.0.0.0:5562".to_string(),
            publish_address: "0.0.0.0:5563".to_string(),
            wire_format: WireFormat::Json,
            queue_capacity: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Filtered cloud to decimate
    pub input: String,
    /// Decimated cloud
    pub output: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            input: "pcl_filtered_miro".to_string(),
            output: "pcl_downsampled".to_string(),
        }
    }
}

impl PclConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}
