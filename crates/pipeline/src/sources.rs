//! Collaborator interfaces: where samples and boundaries come from and
//! where finished rasters go.

use crate::error::Result;
use geo::Polygon;
use gw_common::SamplePoint;
use std::path::Path;

/// Backing store of point measurements.
pub trait SampleSource {
    /// All measurements carrying a non-null value for the named field.
    fn samples_for_field(&self, field: &str) -> Result<Vec<SamplePoint>>;
}

/// Source of administrative boundary polygons.
pub trait BoundarySource {
    /// Polygons for the requested unit identifiers, in WGS84.
    fn boundaries(&self, ids: &[String]) -> Result<Vec<Polygon<f64>>>;
}

/// Layer-hosting sink accepting finished raster artifacts.
pub trait PublishSink {
    /// Publish the raster file under the given layer name, overwriting
    /// any previous layer of that name.
    fn publish_raster(&self, layer: &str, path: &Path) -> Result<()>;
}
