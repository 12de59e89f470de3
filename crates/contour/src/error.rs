//! Contour extraction error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContourError {
    #[error("surface has no finite cells to contour")]
    NoFiniteCells,

    #[error("contour interval must be positive, got {0}")]
    InvalidInterval(f64),

    #[error("no contour lines produced at any level")]
    NoContours,
}
