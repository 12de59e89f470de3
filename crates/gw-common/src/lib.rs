//! Common types shared across the groundwater surface pipeline.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod sample;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use error::{GwError, GwResult};
pub use grid::{GeoTransform, SurfaceGrid};
pub use sample::{sample_extent, validate_samples, SamplePoint};
