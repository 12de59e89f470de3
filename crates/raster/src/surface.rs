//! In-memory raster surfaces.

use gw_common::{BoundingBox, CrsCode, GeoTransform, SurfaceGrid};

/// Single-band floating point raster. No-data cells hold NaN.
#[derive(Debug, Clone)]
pub struct ScalarRaster {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub crs: CrsCode,
    pub data: Vec<f32>,
}

impl ScalarRaster {
    /// Wrap an interpolated surface (row-major, row 0 north) as a WGS84
    /// raster aligned to the grid it was computed on.
    pub fn from_surface(values: &[f64], grid: &SurfaceGrid) -> Self {
        debug_assert_eq!(values.len(), grid.len());
        Self {
            width: grid.width,
            height: grid.height,
            transform: grid.transform(),
            crs: CrsCode::Epsg4326,
            data: values.iter().map(|v| *v as f32).collect(),
        }
    }

    pub fn new(
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: CrsCode,
        data: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            transform,
            crs,
            data,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    /// Geographic extent covered by the raster.
    pub fn bounds(&self) -> BoundingBox {
        self.transform.raster_bounds(self.width, self.height)
    }

    /// Number of cells holding a finite value.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_finite()).count()
    }

    /// Min and max over finite cells, or None when every cell is no-data.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        let mut range: Option<(f32, f32)> = None;
        for &v in &self.data {
            if v.is_finite() {
                range = Some(match range {
                    Some((lo, hi)) => (lo.min(v), hi.max(v)),
                    None => (v, v),
                });
            }
        }
        range
    }
}

/// Three-band RGB raster, interleaved bytes. No-data cells are black.
#[derive(Debug, Clone)]
pub struct RgbRaster {
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    pub crs: CrsCode,
    /// RGB triples, row-major, `width * height * 3` bytes.
    pub data: Vec<u8>,
}

impl RgbRaster {
    pub fn new(
        width: usize,
        height: usize,
        transform: GeoTransform,
        crs: CrsCode,
        data: Vec<u8>,
    ) -> Self {
        debug_assert_eq!(data.len(), width * height * 3);
        Self {
            width,
            height,
            transform,
            crs,
            data,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> (u8, u8, u8) {
        let i = (row * self.width + col) * 3;
        (self.data[i], self.data[i + 1], self.data[i + 2])
    }

    pub fn bounds(&self) -> BoundingBox {
        self.transform.raster_bounds(self.width, self.height)
    }

    /// Number of cells that are not pure black (the no-data marker).
    pub fn valid_count(&self) -> usize {
        self.data
            .chunks_exact(3)
            .filter(|c| c[0] != 0 || c[1] != 0 || c[2] != 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_surface_alignment() {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let grid = SurfaceGrid::cover(&b, &b, 0.1).unwrap();
        let values: Vec<f64> = (0..grid.len()).map(|i| i as f64).collect();
        let raster = ScalarRaster::from_surface(&values, &grid);

        assert_eq!(raster.width, grid.width);
        assert_eq!(raster.height, grid.height);
        assert_eq!(raster.get(1, 2), (grid.width + 2) as f32);

        let (x, y) = raster.transform.cell_center(0, 0);
        assert!((x - grid.x_coord(0)).abs() < 1e-9);
        assert!((y - grid.y_coord(0)).abs() < 1e-9);
    }

    #[test]
    fn test_value_range_skips_nan() {
        let t = GeoTransform::new(0.0, 2.0, 1.0, -1.0);
        let raster = ScalarRaster::new(
            2,
            2,
            t,
            CrsCode::Epsg4326,
            vec![1.0, f32::NAN, 3.0, 2.0],
        );
        assert_eq!(raster.value_range(), Some((1.0, 3.0)));
        assert_eq!(raster.valid_count(), 3);
    }
}
