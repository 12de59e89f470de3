//! Coordinate reference system transformations.
//!
//! Implements map projections from scratch without external dependencies.

pub mod transform;
pub mod utm;

pub use transform::{transform_bbox, CoordTransformer};
pub use utm::{utm_zone_for, TransverseMercator};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("latitude {0} outside valid range for transverse Mercator")]
    LatitudeOutOfRange(f64),

    #[error("unsupported transformation from {from} to {to}")]
    UnsupportedTransform { from: String, to: String },
}
