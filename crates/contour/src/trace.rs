//! Marching-squares isoline tracing.

use crate::error::ContourError;
use crate::levels::contour_levels;
use crate::smooth::smooth_line;
use raster::ScalarRaster;
use std::collections::HashMap;
use tracing::{debug, info};

/// NaN cells are replaced by `min - NAN_SENTINEL_DROP` before tracing so
/// they can never satisfy an iso-level condition.
const NAN_SENTINEL_DROP: f64 = 1000.0;

/// Minimum traced path length; shorter fragments are noise.
const MIN_PATH_POINTS: usize = 3;

/// One traced isoline in geographic coordinates.
#[derive(Debug, Clone)]
pub struct ContourLine {
    pub level: f64,
    /// Index of this trace among the traces of its level.
    pub index: usize,
    pub coords: Vec<(f64, f64)>,
}

/// All isolines extracted from one surface.
#[derive(Debug, Clone)]
pub struct ContourSet {
    pub lines: Vec<ContourLine>,
    pub levels: Vec<f64>,
    pub min: f64,
    pub max: f64,
    pub interval: Option<f64>,
}

/// Extract contour lines from a scalar raster.
///
/// Zero lines across every level is an error; callers distinguish it
/// from invalid input by variant.
pub fn extract_contours(
    raster: &ScalarRaster,
    interval: Option<f64>,
    smooth: bool,
) -> Result<ContourSet, ContourError> {
    let (min, max) = raster
        .value_range()
        .map(|(lo, hi)| (lo as f64, hi as f64))
        .ok_or(ContourError::NoFiniteCells)?;

    let finite: Vec<f64> = raster
        .data
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v as f64)
        .collect();
    let mean = finite.iter().sum::<f64>() / finite.len() as f64;
    let levels = contour_levels(min, max, mean, interval)?;

    // Substitute NaN with a value far below the range so no cell edge
    // straddles a level because of missing data
    let sentinel = min - NAN_SENTINEL_DROP;
    let grid: Vec<f64> = raster
        .data
        .iter()
        .map(|&v| if v.is_finite() { v as f64 } else { sentinel })
        .collect();

    let mut lines = Vec::new();
    for &level in &levels {
        let paths = trace_level(&grid, raster.width, raster.height, level);
        let mut index = 0;
        for path in paths {
            if path.len() < MIN_PATH_POINTS {
                continue;
            }

            let mut coords: Vec<(f64, f64)> = path
                .iter()
                .map(|&(row, col)| raster_point(raster, row, col))
                .collect();
            close_if_open(&mut coords);
            if smooth {
                smooth_line(&mut coords);
            }

            lines.push(ContourLine {
                level,
                index,
                coords,
            });
            index += 1;
        }
        debug!(level, traces = index, "traced contour level");
    }

    if lines.is_empty() {
        return Err(ContourError::NoContours);
    }
    info!(
        levels = levels.len(),
        lines = lines.len(),
        "extracted contours"
    );

    Ok(ContourSet {
        lines,
        levels,
        min,
        max,
        interval,
    })
}

/// Append the first coordinate when a path of three or more points does
/// not already end where it started.
pub fn close_if_open(coords: &mut Vec<(f64, f64)>) {
    if coords.len() >= MIN_PATH_POINTS && coords.first() != coords.last() {
        if let Some(first) = coords.first().copied() {
            coords.push(first);
        }
    }
}

/// Pixel (row, col) to geographic coordinates. Grid values sit at cell
/// centers, so the half-pixel shift matches the affine transform.
fn raster_point(raster: &ScalarRaster, row: f64, col: f64) -> (f64, f64) {
    let t = &raster.transform;
    (
        t.origin_x + (col + 0.5) * t.pixel_width,
        t.origin_y + (row + 0.5) * t.pixel_height,
    )
}

/// Trace all isolines of one level, in fractional pixel coordinates.
fn trace_level(grid: &[f64], width: usize, height: usize, level: f64) -> Vec<Vec<(f64, f64)>> {
    if width < 2 || height < 2 {
        return Vec::new();
    }

    let at = |row: usize, col: usize| grid[row * width + col];
    let mut segments: Vec<((f64, f64), (f64, f64))> = Vec::new();

    for row in 0..height - 1 {
        for col in 0..width - 1 {
            let tl = at(row, col);
            let tr = at(row, col + 1);
            let br = at(row + 1, col + 1);
            let bl = at(row + 1, col);

            let case = ((tl >= level) as u8) << 3
                | ((tr >= level) as u8) << 2
                | ((br >= level) as u8) << 1
                | ((bl >= level) as u8);
            if case == 0 || case == 15 {
                continue;
            }

            let r = row as f64;
            let c = col as f64;
            let top = (r, c + edge_t(tl, tr, level));
            let bottom = (r + 1.0, c + edge_t(bl, br, level));
            let left = (r + edge_t(tl, bl, level), c);
            let right = (r + edge_t(tr, br, level), c + 1.0);

            match case {
                1 | 14 => segments.push((left, bottom)),
                2 | 13 => segments.push((bottom, right)),
                3 | 12 => segments.push((left, right)),
                4 | 11 => segments.push((top, right)),
                6 | 9 => segments.push((top, bottom)),
                7 | 8 => segments.push((left, top)),
                5 | 10 => {
                    // Saddle: disambiguate with the cell-center mean
                    let center_high = (tl + tr + br + bl) / 4.0 >= level;
                    if (case == 5) == center_high {
                        segments.push((left, top));
                        segments.push((bottom, right));
                    } else {
                        segments.push((left, bottom));
                        segments.push((top, right));
                    }
                }
                _ => unreachable!(),
            }
        }
    }

    connect_segments(segments)
}

/// Interpolation parameter of the level crossing between two corner
/// values.
fn edge_t(a: f64, b: f64, level: f64) -> f64 {
    if (b - a).abs() < 1e-12 {
        0.5
    } else {
        ((level - a) / (b - a)).clamp(0.0, 1.0)
    }
}

fn quantize(p: (f64, f64)) -> (i64, i64) {
    ((p.0 * 1e6).round() as i64, (p.1 * 1e6).round() as i64)
}

/// Chain loose segments into polylines by matching shared endpoints.
fn connect_segments(segments: Vec<((f64, f64), (f64, f64))>) -> Vec<Vec<(f64, f64)>> {
    let mut endpoint_index: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, (a, b)) in segments.iter().enumerate() {
        endpoint_index.entry(quantize(*a)).or_default().push(i);
        endpoint_index.entry(quantize(*b)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut paths = Vec::new();

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let (a, b) = segments[start];
        let mut path = vec![a, b];

        // Extend forward from the tail, then backward from the head
        for forward in [true, false] {
            loop {
                let tip = if forward {
                    *path.last().unwrap()
                } else {
                    path[0]
                };
                let Some(candidates) = endpoint_index.get(&quantize(tip)) else {
                    break;
                };
                let Some(i) = candidates.iter().find(|&&i| !used[i]).copied() else {
                    break;
                };
                used[i] = true;

                let (sa, sb) = segments[i];
                let other = if quantize(sa) == quantize(tip) { sb } else { sa };
                if forward {
                    path.push(other);
                } else {
                    path.insert(0, other);
                }
            }
        }

        paths.push(path);
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_common::{CrsCode, GeoTransform};

    /// Radial bump surface: a single closed contour ring per level.
    fn bump_raster(size: usize) -> ScalarRaster {
        let mut data = vec![0.0f32; size * size];
        let center = (size as f64 - 1.0) / 2.0;
        for row in 0..size {
            for col in 0..size {
                let d = ((row as f64 - center).powi(2) + (col as f64 - center).powi(2)).sqrt();
                data[row * size + col] = (100.0 - 10.0 * d) as f32;
            }
        }
        ScalarRaster::new(
            size,
            size,
            GeoTransform::new(77.0, 15.0, 0.001, -0.001),
            CrsCode::Epsg4326,
            data,
        )
    }

    #[test]
    fn test_bump_produces_closed_rings() {
        let raster = bump_raster(21);
        let set = extract_contours(&raster, Some(20.0), false).unwrap();
        assert!(!set.lines.is_empty());

        for line in &set.lines {
            assert!(line.coords.len() >= 4);
            assert_eq!(line.coords.first(), line.coords.last(), "level {}", line.level);
        }
    }

    #[test]
    fn test_close_if_open_appends_exactly_one() {
        let mut open = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)];
        close_if_open(&mut open);
        assert_eq!(open.len(), 4);
        assert_eq!(open[3], (0.0, 0.0));

        let mut closed = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)];
        close_if_open(&mut closed);
        assert_eq!(closed.len(), 4);
    }

    #[test]
    fn test_nan_regions_do_not_contour() {
        let mut raster = bump_raster(21);
        // Mask the right half; sentinel substitution keeps levels away
        for row in 0..21 {
            for col in 11..21 {
                raster.data[row * 21 + col] = f32::NAN;
            }
        }
        let set = extract_contours(&raster, Some(20.0), false).unwrap();
        for line in &set.lines {
            for &(x, _) in &line.coords {
                // 0.0005 of slack for the edge interpolation near the mask
                assert!(x <= 77.0 + 0.0115, "coordinate {x} inside masked half");
            }
        }
    }

    #[test]
    fn test_all_nan_is_distinct_error() {
        let raster = ScalarRaster::new(
            4,
            4,
            GeoTransform::new(0.0, 4.0, 1.0, -1.0),
            CrsCode::Epsg4326,
            vec![f32::NAN; 16],
        );
        assert!(matches!(
            extract_contours(&raster, None, false),
            Err(ContourError::NoFiniteCells)
        ));
    }

    #[test]
    fn test_flat_surface_yields_no_contours() {
        let raster = ScalarRaster::new(
            8,
            8,
            GeoTransform::new(0.0, 8.0, 1.0, -1.0),
            CrsCode::Epsg4326,
            vec![5.0; 64],
        );
        // Interval wider than the (zero) range: single mean level, which
        // never crosses any edge of a constant surface
        assert!(matches!(
            extract_contours(&raster, Some(10.0), false),
            Err(ContourError::NoContours)
        ));
    }

    #[test]
    fn test_vertical_gradient_line_spans_grid() {
        let mut data = vec![0.0f32; 10 * 10];
        for row in 0..10 {
            for col in 0..10 {
                data[row * 10 + col] = col as f32;
            }
        }
        let raster = ScalarRaster::new(
            10,
            10,
            GeoTransform::new(0.0, 10.0, 1.0, -1.0),
            CrsCode::Epsg4326,
            data,
        );
        let set = extract_contours(&raster, Some(4.0), false).unwrap();
        let line = set
            .lines
            .iter()
            .find(|l| (l.level - 4.0).abs() < 1e-9)
            .unwrap();
        // A straight vertical isoline crossing all 9 cell rows, closed
        // afterwards
        assert!(line.coords.len() >= 10);
    }
}
