//! Error types for pcl-voxel

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// pcl-voxel error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport or wire error from the shared streaming layer
    #[error(transparent)]
    Stream(#[from] stereo_sync::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Leaf size is zero, negative or not finite
    #[error("Invalid leaf size: {0:?}")]
    InvalidLeafSize([f32; 3]),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
