//! Inverse distance weighted interpolation.

use crate::error::InterpolationError;
use gw_common::{SamplePoint, SurfaceGrid};
use rayon::prelude::*;

/// Default inverse-distance exponent.
pub const DEFAULT_POWER: f64 = 2.0;

/// Distance floor for samples coincident with a grid point. Keeps the
/// weight finite while still dominating every other sample.
const MIN_DISTANCE: f64 = 1e-10;

/// IDW parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdwParams {
    /// Inverse-distance exponent (higher values localize the estimate).
    pub power: f64,
    /// Optional search radius in grid units; samples beyond it get zero
    /// weight. `None` means every sample contributes to every cell.
    pub radius: Option<f64>,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: DEFAULT_POWER,
            radius: None,
        }
    }
}

/// Interpolate scattered samples onto the grid with inverse distance
/// weighting.
///
/// Returns values in row-major order, row 0 at the northern edge. Cells
/// where every sample falls outside the search radius come out as 0.0,
/// matching the behavior downstream consumers already rely on.
pub fn interpolate_idw(
    samples: &[SamplePoint],
    grid: &SurfaceGrid,
    params: &IdwParams,
) -> Result<Vec<f64>, InterpolationError> {
    if samples.is_empty() {
        return Err(InterpolationError::InsufficientSamples {
            method: "IDW",
            needed: 1,
            got: 0,
        });
    }
    if params.power <= 0.0 || !params.power.is_finite() {
        return Err(InterpolationError::InvalidParameter(format!(
            "IDW power must be positive, got {}",
            params.power
        )));
    }
    if let Some(r) = params.radius {
        if r <= 0.0 || !r.is_finite() {
            return Err(InterpolationError::InvalidParameter(format!(
                "IDW radius must be positive, got {r}"
            )));
        }
    }

    let width = grid.width;
    let xs = grid.x_coords();
    let mut values = vec![0.0f64; grid.len()];

    values
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out_row)| {
            let y = grid.y_coord(row);
            for (col, out) in out_row.iter_mut().enumerate() {
                *out = estimate_cell(samples, xs[col], y, params);
            }
        });

    Ok(values)
}

fn estimate_cell(samples: &[SamplePoint], x: f64, y: f64, params: &IdwParams) -> f64 {
    let mut weight_sum = 0.0;
    let mut weighted_value = 0.0;

    for s in samples {
        let dx = s.x - x;
        let dy = s.y - y;
        let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);

        if let Some(radius) = params.radius {
            if dist > radius {
                continue;
            }
        }

        let w = 1.0 / dist.powf(params.power);
        weight_sum += w;
        weighted_value += w * s.value;
    }

    // A cell with no in-radius samples divides by 1 instead of 0 and
    // yields 0.0 rather than NaN.
    if weight_sum == 0.0 {
        weight_sum = 1.0;
    }

    weighted_value / weight_sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_common::BoundingBox;

    fn small_grid() -> SurfaceGrid {
        let b = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        SurfaceGrid::cover(&b, &b, 0.1).unwrap()
    }

    #[test]
    fn test_estimate_stays_within_sample_range() {
        let samples = vec![
            SamplePoint::new(0.1, 0.1, 10.0),
            SamplePoint::new(0.9, 0.2, 20.0),
            SamplePoint::new(0.5, 0.8, 30.0),
        ];
        let grid = small_grid();
        let values = interpolate_idw(&samples, &grid, &IdwParams::default()).unwrap();

        for v in &values {
            assert!(*v >= 10.0 - 1e-9 && *v <= 30.0 + 1e-9, "value {v}");
        }
    }

    #[test]
    fn test_coincident_sample_dominates() {
        let grid = small_grid();
        let x = grid.x_coord(3);
        let y = grid.y_coord(4);
        let samples = vec![
            SamplePoint::new(x, y, 42.0),
            SamplePoint::new(0.9, 0.9, -5.0),
        ];
        let values = interpolate_idw(&samples, &grid, &IdwParams::default()).unwrap();
        let v = values[4 * grid.width + 3];
        assert!((v - 42.0).abs() < 1e-6, "got {v}");
    }

    #[test]
    fn test_out_of_radius_cells_are_zero_not_nan() {
        let grid = small_grid();
        let samples = vec![SamplePoint::new(0.0, 0.0, 99.0)];
        let params = IdwParams {
            power: 2.0,
            radius: Some(0.05),
        };
        let values = interpolate_idw(&samples, &grid, &params).unwrap();

        // Far corner is outside the radius: unweighted cells are exactly 0.0
        let far = values[grid.width - 1];
        assert_eq!(far, 0.0);
        assert!(values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_rejects_empty_and_bad_params() {
        let grid = small_grid();
        assert!(interpolate_idw(&[], &grid, &IdwParams::default()).is_err());

        let samples = vec![SamplePoint::new(0.5, 0.5, 1.0)];
        let bad_power = IdwParams {
            power: 0.0,
            radius: None,
        };
        assert!(interpolate_idw(&samples, &grid, &bad_power).is_err());

        let bad_radius = IdwParams {
            power: 2.0,
            radius: Some(-1.0),
        };
        assert!(interpolate_idw(&samples, &grid, &bad_radius).is_err());
    }
}
