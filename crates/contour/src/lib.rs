//! Iso-value contour extraction from scalar rasters, packaged as
//! GeoJSON line features.

pub mod error;
pub mod geojson;
pub mod levels;
pub mod smooth;
pub mod trace;

pub use error::ContourError;
pub use geojson::{feature_collection, FeatureCollection};
pub use levels::contour_levels;
pub use trace::{extract_contours, ContourLine, ContourSet};
