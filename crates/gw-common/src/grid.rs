//! Regular sampling grids for interpolated surfaces.

use crate::{BoundingBox, GwError, GwResult};
use serde::{Deserialize, Serialize};

/// Default grid spacing in WGS84 degrees (~100 m).
pub const DEFAULT_RESOLUTION_DEG: f64 = 0.001;

/// Fixed margin added around the combined sample/boundary extent, in degrees.
pub const GRID_MARGIN_DEG: f64 = 0.01;

/// Affine mapping between raster pixel indices and world coordinates.
///
/// `origin_x`/`origin_y` is the top-left corner of pixel (0, 0);
/// `pixel_height` is negative for north-up rasters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// World coordinates of the center of pixel (row, col).
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Fractional (row, col) of a world coordinate, measured in pixel units
    /// from the raster origin. May fall outside the raster.
    pub fn geo_to_cell(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (y - self.origin_y) / self.pixel_height - 0.5,
            (x - self.origin_x) / self.pixel_width - 0.5,
        )
    }

    /// Bounding box of the pixel (row, col).
    pub fn cell_bounds(&self, row: usize, col: usize) -> BoundingBox {
        let x0 = self.origin_x + col as f64 * self.pixel_width;
        let y0 = self.origin_y + row as f64 * self.pixel_height;
        let x1 = x0 + self.pixel_width;
        let y1 = y0 + self.pixel_height;
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Extent of a raster of the given shape under this transform.
    pub fn raster_bounds(&self, width: usize, height: usize) -> BoundingBox {
        let x1 = self.origin_x + width as f64 * self.pixel_width;
        let y1 = self.origin_y + height as f64 * self.pixel_height;
        BoundingBox::new(
            self.origin_x.min(x1),
            self.origin_y.min(y1),
            self.origin_x.max(x1),
            self.origin_y.max(y1),
        )
    }
}

/// A regular WGS84 sampling grid covering the area of interest.
///
/// Column i sits at `x_min + i * resolution`; rows are ordered north to
/// south, row j at `y_top - j * resolution`. Both axes follow half-open
/// `arange` semantics: the final coordinate stays strictly below the
/// extent maximum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGrid {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub resolution: f64,
    pub width: usize,
    pub height: usize,
}

impl SurfaceGrid {
    /// Build the grid covering both the sample extent and the boundary
    /// extent, expanded by [`GRID_MARGIN_DEG`] on every side.
    ///
    /// Callers must have verified that both extents are non-degenerate;
    /// a zero-cell grid is rejected here as a final guard.
    pub fn cover(
        sample_extent: &BoundingBox,
        boundary_extent: &BoundingBox,
        resolution: f64,
    ) -> GwResult<Self> {
        if resolution <= 0.0 || !resolution.is_finite() {
            return Err(GwError::InvalidGrid(format!(
                "resolution must be positive, got {resolution}"
            )));
        }

        let bounds = sample_extent
            .union(boundary_extent)
            .expand(GRID_MARGIN_DEG);

        let width = (bounds.width() / resolution).ceil() as usize;
        let height = (bounds.height() / resolution).ceil() as usize;

        if width == 0 || height == 0 {
            return Err(GwError::InvalidGrid(format!(
                "extent {:?} collapses to a {}x{} grid at resolution {}",
                bounds, width, height, resolution
            )));
        }

        Ok(Self {
            x_min: bounds.min_x,
            y_min: bounds.min_y,
            x_max: bounds.max_x,
            y_max: bounds.max_y,
            resolution,
            width,
            height,
        })
    }

    /// Longitude of column `col`.
    pub fn x_coord(&self, col: usize) -> f64 {
        self.x_min + col as f64 * self.resolution
    }

    /// Latitude of row `row` (rows run north to south).
    pub fn y_coord(&self, row: usize) -> f64 {
        self.y_top() - row as f64 * self.resolution
    }

    /// Latitude of the northernmost grid row.
    pub fn y_top(&self) -> f64 {
        self.y_min + (self.height - 1) as f64 * self.resolution
    }

    /// Ascending column coordinates.
    pub fn x_coords(&self) -> Vec<f64> {
        (0..self.width).map(|i| self.x_coord(i)).collect()
    }

    /// Row coordinates, north to south.
    pub fn y_coords(&self) -> Vec<f64> {
        (0..self.height).map(|j| self.y_coord(j)).collect()
    }

    /// Affine transform placing grid points at pixel centers.
    pub fn transform(&self) -> GeoTransform {
        GeoTransform::new(
            self.x_min - self.resolution / 2.0,
            self.y_top() + self.resolution / 2.0,
            self.resolution,
            -self.resolution,
        )
    }

    /// Total number of grid cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
