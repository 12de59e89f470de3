//! Pipeline error types.

use contour::ContourError;
use gw_common::GwError;
use interpolation::InterpolationError;
use raster::RasterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no samples found for field '{0}'")]
    NoSamples(String),

    #[error("no boundary geometries found for ids {0:?}")]
    NoBoundaries(Vec<String>),

    #[error("sample source failed: {0}")]
    SampleSource(String),

    #[error("boundary source failed: {0}")]
    BoundarySource(String),

    #[error("publish rejected: {0}")]
    Publish(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Common(#[from] GwError),

    #[error(transparent)]
    Interpolation(#[from] InterpolationError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Contour(#[from] ContourError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
