//! Error types for pointclust

use thiserror::Error;

/// Main error type for pointclust operations
///
/// Every variant is a contract violation by the caller. Nothing is retried
/// internally, since rerunning a deterministic computation with the same
/// input cannot change its outcome.
#[derive(Error, Debug)]
pub enum Error {
    /// A numeric parameter is out of its valid range (eps, voxel size, k, ...)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The input data cannot be processed (e.g. an empty point cloud)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Arguments are inconsistent with each other (e.g. label/point length mismatch)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pointclust operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Error::InvalidParameter(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
