//! Error types for stereo-sync

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// stereo-sync error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Wire (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Frame exceeds the maximum allowed size
    #[error("Frame too large: {size} bytes (max {max})")]
    FrameTooLarge {
        /// Announced frame size
        size: usize,
        /// Configured maximum
        max: usize,
    },

    /// Frame is structurally invalid (missing topic terminator, bad UTF-8)
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Thread could not be spawned or panicked
    #[error("Thread error: {0}")]
    Thread(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<postcard::Error> for Error {
    fn from(e: postcard::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
