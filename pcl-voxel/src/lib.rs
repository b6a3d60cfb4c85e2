//! pcl-voxel - voxel-grid decimation for colored point clouds
//!
//! Library half of the `pcl-voxel` daemon. The filter itself has no I/O;
//! [`service`] wires it to the streaming layer shared with stereo-sync.

pub mod cloud;
pub mod config;
pub mod error;
pub mod service;
pub mod voxel_grid;

pub use cloud::{PointCloud, PointXyzRgb};
pub use config::PclConfig;
pub use error::{Error, Result};
pub use service::DownsampleService;
pub use voxel_grid::{VoxelGrid, VoxelGridConfig, downsample};
