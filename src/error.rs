//! Error types for dnssieve.

use thiserror::Error;

/// Error type for dnssieve operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Rule line rejected by the parser or pattern compiler
    #[error("invalid rule syntax")]
    InvalidSyntax,

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Upstream classification service failure
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for dnssieve operations.
pub type Result<T> = std::result::Result<T, Error>;
