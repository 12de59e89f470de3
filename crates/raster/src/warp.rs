//! Raster reprojection between coordinate reference systems.
//!
//! Builds the destination grid from a CRS-aware bounds transformation,
//! then inverse-maps each destination cell center into the source
//! raster. Scalar bands resample bilinearly; RGB bands use nearest
//! neighbor so class colors never blend at bin boundaries.

use crate::error::RasterError;
use crate::surface::{RgbRaster, ScalarRaster};
use gw_common::{CrsCode, GeoTransform};
use projection::{transform_bbox, CoordTransformer};
use rayon::prelude::*;
use tracing::debug;

/// Default target ground resolution, in the target CRS's linear unit
/// (30 m for UTM).
pub const DEFAULT_TARGET_RESOLUTION: f64 = 30.0;

/// Reproject a scalar raster with bilinear resampling.
pub fn reproject_scalar(
    src: &ScalarRaster,
    target: CrsCode,
    resolution: f64,
) -> Result<ScalarRaster, RasterError> {
    let (dst_transform, width, height, inverse) = destination_grid(
        &src.transform,
        src.width,
        src.height,
        src.crs,
        target,
        resolution,
    )?;

    let mut data = vec![f32::NAN; width * height];
    let rows: Vec<Result<(), RasterError>> = data
        .par_chunks_mut(width)
        .enumerate()
        .map(|(row, out_row)| {
            for (col, out) in out_row.iter_mut().enumerate() {
                let (x, y) = dst_transform.cell_center(row, col);
                let (sx, sy) = inverse.transform(x, y)?;
                let (frow, fcol) = src.transform.geo_to_cell(sx, sy);
                *out = bilinear_sample(src, frow, fcol);
            }
            Ok(())
        })
        .collect();
    for r in rows {
        r?;
    }

    Ok(ScalarRaster::new(width, height, dst_transform, target, data))
}

/// Reproject an RGB raster with nearest-neighbor resampling.
pub fn reproject_rgb(
    src: &RgbRaster,
    target: CrsCode,
    resolution: f64,
) -> Result<RgbRaster, RasterError> {
    let (dst_transform, width, height, inverse) = destination_grid(
        &src.transform,
        src.width,
        src.height,
        src.crs,
        target,
        resolution,
    )?;

    let mut data = vec![0u8; width * height * 3];
    let rows: Vec<Result<(), RasterError>> = data
        .par_chunks_mut(width * 3)
        .enumerate()
        .map(|(row, out_row)| {
            for col in 0..width {
                let (x, y) = dst_transform.cell_center(row, col);
                let (sx, sy) = inverse.transform(x, y)?;
                let (frow, fcol) = src.transform.geo_to_cell(sx, sy);
                let srow = frow.round();
                let scol = fcol.round();
                if srow >= 0.0
                    && scol >= 0.0
                    && (srow as usize) < src.height
                    && (scol as usize) < src.width
                {
                    let (r, g, b) = src.get(srow as usize, scol as usize);
                    out_row[col * 3] = r;
                    out_row[col * 3 + 1] = g;
                    out_row[col * 3 + 2] = b;
                }
            }
            Ok(())
        })
        .collect();
    for r in rows {
        r?;
    }

    Ok(RgbRaster::new(width, height, dst_transform, target, data))
}

type DestinationGrid = (GeoTransform, usize, usize, CoordTransformer);

fn destination_grid(
    src_transform: &GeoTransform,
    src_width: usize,
    src_height: usize,
    source: CrsCode,
    target: CrsCode,
    resolution: f64,
) -> Result<DestinationGrid, RasterError> {
    if resolution <= 0.0 || !resolution.is_finite() {
        return Err(RasterError::Warp(format!(
            "target resolution must be positive, got {resolution}"
        )));
    }

    let forward = CoordTransformer::between(source, target)?;
    let src_bounds = src_transform.raster_bounds(src_width, src_height);
    let dst_bounds = transform_bbox(&forward, &src_bounds)?;

    let width = (dst_bounds.width() / resolution).ceil() as usize;
    let height = (dst_bounds.height() / resolution).ceil() as usize;
    if width == 0 || height == 0 {
        return Err(RasterError::Warp(format!(
            "destination grid collapsed to {width}x{height}"
        )));
    }
    debug!(%source, %target, width, height, resolution, "computed destination grid");

    let dst_transform =
        GeoTransform::new(dst_bounds.min_x, dst_bounds.max_y, resolution, -resolution);
    Ok((dst_transform, width, height, forward.inverted()))
}

/// NaN-aware bilinear sample at a fractional (row, col). Invalid or
/// out-of-range neighbors drop out with weight renormalization; all
/// four invalid yields NaN.
fn bilinear_sample(src: &ScalarRaster, frow: f64, fcol: f64) -> f32 {
    if frow < -0.5
        || fcol < -0.5
        || frow > src.height as f64 - 0.5
        || fcol > src.width as f64 - 0.5
    {
        return f32::NAN;
    }

    let r0 = frow.floor();
    let c0 = fcol.floor();
    let dr = frow - r0;
    let dc = fcol - c0;

    let mut value = 0.0f64;
    let mut weight = 0.0f64;
    for (row, wr) in [(r0, 1.0 - dr), (r0 + 1.0, dr)] {
        for (col, wc) in [(c0, 1.0 - dc), (c0 + 1.0, dc)] {
            let w = wr * wc;
            if w <= 0.0 || row < 0.0 || col < 0.0 {
                continue;
            }
            let (row, col) = (row as usize, col as usize);
            if row >= src.height || col >= src.width {
                continue;
            }
            let v = src.get(row, col);
            if v.is_finite() {
                value += w * v as f64;
                weight += w;
            }
        }
    }

    if weight > 0.0 {
        (value / weight) as f32
    } else {
        f32::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_raster(value: f32) -> ScalarRaster {
        // 0.01 degree cells over a small box near the assessment area
        ScalarRaster::new(
            40,
            30,
            GeoTransform::new(79.0, 15.3, 0.01, -0.01),
            CrsCode::Epsg4326,
            vec![value; 40 * 30],
        )
    }

    #[test]
    fn test_constant_raster_roundtrip_exact() {
        let src = constant_raster(12.5);
        let utm = reproject_scalar(&src, CrsCode::UTM_44N, DEFAULT_TARGET_RESOLUTION).unwrap();
        assert_eq!(utm.crs, CrsCode::UTM_44N);
        assert!(utm.valid_count() > 0);

        let back = reproject_scalar(&utm, CrsCode::Epsg4326, 0.01).unwrap();
        // Sample cells well inside the footprint
        for row in 5..25 {
            for col in 5..35.min(back.width) {
                let v = back.get(row, col);
                if v.is_finite() {
                    assert!((v - 12.5).abs() < 1e-4, "at ({row},{col}): {v}");
                }
            }
        }
        let center = back.get(back.height / 2, back.width / 2);
        assert!((center - 12.5).abs() < 1e-4);
    }

    #[test]
    fn test_nodata_propagates() {
        let mut src = constant_raster(3.0);
        // Punch a NaN hole in the middle
        for row in 10..20 {
            for col in 15..25 {
                src.data[row * src.width + col] = f32::NAN;
            }
        }
        let utm = reproject_scalar(&src, CrsCode::UTM_44N, 100.0).unwrap();
        assert!(utm.data.iter().any(|v| v.is_nan()));
        assert!(utm.data.iter().any(|v| v.is_finite()));
    }

    #[test]
    fn test_rgb_nearest_preserves_palette() {
        let mut data = vec![0u8; 40 * 30 * 3];
        for c in data.chunks_exact_mut(3) {
            c.copy_from_slice(&[10, 200, 30]);
        }
        let src = RgbRaster::new(
            40,
            30,
            GeoTransform::new(79.0, 15.3, 0.01, -0.01),
            CrsCode::Epsg4326,
            data,
        );
        let utm = reproject_rgb(&src, CrsCode::UTM_44N, 50.0).unwrap();

        // Every non-black output pixel is exactly the source color
        let mut seen = 0;
        for c in utm.data.chunks_exact(3) {
            if c != [0, 0, 0] {
                assert_eq!(c, &[10, 200, 30]);
                seen += 1;
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn test_bad_resolution_rejected() {
        let src = constant_raster(1.0);
        assert!(reproject_scalar(&src, CrsCode::UTM_44N, 0.0).is_err());
        assert!(reproject_scalar(&src, CrsCode::UTM_44N, f64::NAN).is_err());
    }
}
