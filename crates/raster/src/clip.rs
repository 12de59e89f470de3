//! Clip rasters to administrative boundary polygons.
//!
//! The output window shrinks to the boundary envelope and every cell
//! whose footprint touches a polygon survives; all other cells become
//! no-data. Invalid rings are repaired before use, and a union of the
//! repaired polygons is attempted first with the individual list as the
//! fallback strategy.

use crate::error::RasterError;
use crate::surface::{RgbRaster, ScalarRaster};
use geo::{BooleanOps, BoundingRect, Coord, Intersects, LineString, MultiPolygon, Polygon, Rect};
use gw_common::{BoundingBox, GeoTransform};
use tracing::{debug, warn};

/// Clip a scalar raster; cells outside the boundary become NaN.
pub fn clip_scalar(
    raster: &ScalarRaster,
    boundaries: &[Polygon<f64>],
) -> Result<ScalarRaster, RasterError> {
    let mask = BoundaryMask::build(boundaries, &raster.transform, raster.width, raster.height)?;
    let mut data = vec![f32::NAN; mask.width * mask.height];
    let mut kept = 0usize;

    for row in 0..mask.height {
        for col in 0..mask.width {
            if mask.touched(row, col) {
                data[row * mask.width + col] = raster.get(mask.row0 + row, mask.col0 + col);
                kept += 1;
            }
        }
    }
    if kept == 0 {
        return Err(RasterError::EmptyClipResult(
            "no cells touch the boundary".to_string(),
        ));
    }

    Ok(ScalarRaster::new(
        mask.width,
        mask.height,
        mask.transform,
        raster.crs,
        data,
    ))
}

/// Clip an RGB raster; cells outside the boundary become black.
pub fn clip_rgb(
    raster: &RgbRaster,
    boundaries: &[Polygon<f64>],
) -> Result<RgbRaster, RasterError> {
    let mask = BoundaryMask::build(boundaries, &raster.transform, raster.width, raster.height)?;
    let mut data = vec![0u8; mask.width * mask.height * 3];
    let mut kept = 0usize;

    for row in 0..mask.height {
        for col in 0..mask.width {
            if mask.touched(row, col) {
                let (r, g, b) = raster.get(mask.row0 + row, mask.col0 + col);
                let i = (row * mask.width + col) * 3;
                data[i] = r;
                data[i + 1] = g;
                data[i + 2] = b;
                kept += 1;
            }
        }
    }
    if kept == 0 {
        return Err(RasterError::EmptyClipResult(
            "no cells touch the boundary".to_string(),
        ));
    }

    Ok(RgbRaster::new(
        mask.width,
        mask.height,
        mask.transform,
        raster.crs,
        data,
    ))
}

/// Pixel window plus per-cell coverage flags for one clip operation.
struct BoundaryMask {
    row0: usize,
    col0: usize,
    width: usize,
    height: usize,
    transform: GeoTransform,
    flags: Vec<bool>,
}

impl BoundaryMask {
    fn build(
        boundaries: &[Polygon<f64>],
        transform: &GeoTransform,
        raster_width: usize,
        raster_height: usize,
    ) -> Result<Self, RasterError> {
        let polygons = prepare_boundaries(boundaries)?;

        let raster_bounds = transform.raster_bounds(raster_width, raster_height);
        let envelope = geometry_envelope(&polygons);
        let window_bounds = envelope
            .intersection(&raster_bounds)
            .ok_or(RasterError::NoOverlap)?;

        // Pixel window covering the overlap (rows count down from the north
        // edge, pixel_height is negative)
        let pw = transform.pixel_width;
        let ph = -transform.pixel_height;
        let col0 = (((window_bounds.min_x - transform.origin_x) / pw).floor().max(0.0)) as usize;
        let col1 = ((window_bounds.max_x - transform.origin_x) / pw).ceil() as usize;
        let row0 = (((transform.origin_y - window_bounds.max_y) / ph).floor().max(0.0)) as usize;
        let row1 = ((transform.origin_y - window_bounds.min_y) / ph).ceil() as usize;
        let col1 = col1.min(raster_width);
        let row1 = row1.min(raster_height);
        if col1 <= col0 || row1 <= row0 {
            return Err(RasterError::EmptyClipResult(format!(
                "window collapsed to {}x{}",
                col1.saturating_sub(col0),
                row1.saturating_sub(row0)
            )));
        }

        let width = col1 - col0;
        let height = row1 - row0;
        let window_transform = GeoTransform::new(
            transform.origin_x + col0 as f64 * transform.pixel_width,
            transform.origin_y + row0 as f64 * transform.pixel_height,
            transform.pixel_width,
            transform.pixel_height,
        );

        let mut flags = vec![false; width * height];
        for row in 0..height {
            for col in 0..width {
                let b = transform.cell_bounds(row0 + row, col0 + col);
                let cell = Rect::new(
                    Coord {
                        x: b.min_x,
                        y: b.min_y,
                    },
                    Coord {
                        x: b.max_x,
                        y: b.max_y,
                    },
                );
                if polygons.iter().any(|p| p.intersects(&cell)) {
                    flags[row * width + col] = true;
                }
            }
        }

        Ok(Self {
            row0,
            col0,
            width,
            height,
            transform: window_transform,
            flags,
        })
    }

    fn touched(&self, row: usize, col: usize) -> bool {
        self.flags[row * self.width + col]
    }
}

/// Repair the boundary list and reduce it to the polygon set used for
/// masking: the union when it can be computed, otherwise the repaired
/// individual geometries.
fn prepare_boundaries(boundaries: &[Polygon<f64>]) -> Result<Vec<Polygon<f64>>, RasterError> {
    let repaired: Vec<Polygon<f64>> = boundaries.iter().filter_map(repair_polygon).collect();
    if repaired.is_empty() {
        return Err(RasterError::NoValidGeometries);
    }

    let unioned = repaired
        .iter()
        .skip(1)
        .fold(MultiPolygon::new(vec![repaired[0].clone()]), |acc, p| {
            acc.union(&MultiPolygon::new(vec![p.clone()]))
        });

    if unioned.0.is_empty() {
        warn!("boundary union came back empty, masking against individual polygons");
        return Ok(repaired);
    }
    debug!(
        input = boundaries.len(),
        unioned = unioned.0.len(),
        "prepared boundary geometries"
    );
    Ok(unioned.0)
}

/// Light-weight ring repair: drop non-finite coordinates, collapse
/// consecutive duplicates, require enough vertices for a closed ring.
fn repair_polygon(polygon: &Polygon<f64>) -> Option<Polygon<f64>> {
    let exterior = repair_ring(polygon.exterior())?;
    let interiors: Vec<LineString<f64>> = polygon
        .interiors()
        .iter()
        .filter_map(repair_ring)
        .collect();
    Some(Polygon::new(exterior, interiors))
}

fn repair_ring(ring: &LineString<f64>) -> Option<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(ring.0.len());
    for c in &ring.0 {
        if !c.x.is_finite() || !c.y.is_finite() {
            return None;
        }
        if coords.last() != Some(c) {
            coords.push(*c);
        }
    }

    // Open rings get closed; degenerate rings are dropped
    if coords.first() != coords.last() {
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }
    }
    if coords.len() < 4 {
        return None;
    }
    Some(LineString::new(coords))
}

fn geometry_envelope(polygons: &[Polygon<f64>]) -> BoundingBox {
    let mut env = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for p in polygons {
        if let Some(rect) = p.bounding_rect() {
            env = env.union(&BoundingBox::new(
                rect.min().x,
                rect.min().y,
                rect.max().x,
                rect.max().y,
            ));
        }
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use gw_common::CrsCode;

    /// 10x10 raster over (0,0)-(10,10), one unit per pixel, value 5 everywhere.
    fn test_raster() -> ScalarRaster {
        ScalarRaster::new(
            10,
            10,
            GeoTransform::new(0.0, 10.0, 1.0, -1.0),
            CrsCode::Epsg4326,
            vec![5.0; 100],
        )
    }

    fn square(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
        polygon![
            (x: min_x, y: min_y),
            (x: max_x, y: min_y),
            (x: max_x, y: max_y),
            (x: min_x, y: max_y),
        ]
    }

    #[test]
    fn test_clip_inside_keeps_cells_and_crops() {
        let raster = test_raster();
        let boundary = vec![square(2.0, 2.0, 5.0, 5.0)];
        let clipped = clip_scalar(&raster, &boundary).unwrap();

        assert!(clipped.width <= 4 && clipped.width >= 3);
        assert!(clipped.valid_count() > 0);
        // Window origin moved to the envelope
        assert!((clipped.transform.origin_x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_outside_is_no_overlap() {
        let raster = test_raster();
        let boundary = vec![square(100.0, 100.0, 110.0, 110.0)];
        assert!(matches!(
            clip_scalar(&raster, &boundary),
            Err(RasterError::NoOverlap)
        ));
    }

    #[test]
    fn test_no_valid_geometries() {
        let raster = test_raster();
        let degenerate = vec![
            polygon![(x: 1.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 1.0)],
            polygon![(x: f64::NAN, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0)],
        ];
        assert!(matches!(
            clip_scalar(&raster, &degenerate),
            Err(RasterError::NoValidGeometries)
        ));
    }

    #[test]
    fn test_all_touched_keeps_edge_cells() {
        let raster = test_raster();
        // A sliver crossing cell (row 5, col 3) without covering its center
        let boundary = vec![square(3.0, 4.05, 3.1, 4.3)];
        let clipped = clip_scalar(&raster, &boundary).unwrap();
        assert!(clipped.valid_count() >= 1);
    }

    #[test]
    fn test_two_disjoint_polygons_both_kept() {
        let raster = test_raster();
        let boundary = vec![square(1.0, 1.0, 2.0, 2.0), square(7.0, 7.0, 8.0, 8.0)];
        let clipped = clip_scalar(&raster, &boundary).unwrap();

        // Envelope spans both squares
        assert!(clipped.width >= 6);
        assert!(clipped.valid_count() >= 2);
        // The gap between them is no-data
        let b = clipped.bounds();
        assert!(b.contains_point(4.5, 4.5));
    }

    #[test]
    fn test_clip_rgb_nodata_is_black() {
        let raster = test_raster();
        let rgb = RgbRaster::new(
            raster.width,
            raster.height,
            raster.transform,
            raster.crs,
            vec![200u8; 10 * 10 * 3],
        );
        let boundary = vec![square(2.0, 2.0, 5.0, 5.0)];
        let clipped = clip_rgb(&rgb, &boundary).unwrap();
        assert!(clipped.valid_count() > 0);
        assert!(clipped.valid_count() < clipped.width * clipped.height
            || clipped.width * clipped.height <= 16);
    }

    #[test]
    fn test_open_ring_repaired() {
        let raster = test_raster();
        // Ring not explicitly closed
        let open = Polygon::new(
            LineString::new(vec![
                Coord { x: 2.0, y: 2.0 },
                Coord { x: 6.0, y: 2.0 },
                Coord { x: 6.0, y: 6.0 },
                Coord { x: 2.0, y: 6.0 },
            ]),
            vec![],
        );
        assert!(clip_scalar(&raster, &[open]).is_ok());
    }
}
