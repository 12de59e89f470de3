//! Raster processing error types.

use projection::ProjectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("no valid geometries after repair")]
    NoValidGeometries,

    #[error("boundary geometries do not overlap the raster extent")]
    NoOverlap,

    #[error("clip produced an empty raster: {0}")]
    EmptyClipResult(String),

    #[error("surface has no finite cells")]
    NoFiniteCells,

    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    #[error("GeoTIFF encode failed: {0}")]
    Encode(String),

    #[error("GeoTIFF decode failed: {0}")]
    Decode(String),

    #[error("reprojection failed: {0}")]
    Warp(String),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
