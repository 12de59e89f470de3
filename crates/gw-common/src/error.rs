//! Error types shared by the surface pipeline crates.

use thiserror::Error;

/// Result type alias using GwError.
pub type GwResult<T> = Result<T, GwError>;

/// Errors for the common grid/sample layer.
#[derive(Debug, Error)]
pub enum GwError {
    #[error("empty sample set: {0}")]
    EmptySamples(String),

    #[error("invalid sample at index {index}: {message}")]
    InvalidSample { index: usize, message: String },

    #[error("degenerate extent: {0}")]
    DegenerateExtent(String),

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("invalid CRS: {0}")]
    InvalidCrs(String),
}

impl From<crate::crs::CrsParseError> for GwError {
    fn from(err: crate::crs::CrsParseError) -> Self {
        GwError::InvalidCrs(err.to_string())
    }
}
