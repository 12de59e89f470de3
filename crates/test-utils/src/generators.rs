//! Test data generators for synthetic well fields and boundaries.
//!
//! These generators create predictable, verifiable measurement patterns
//! that can be used across the test suite.

use geo::{polygon, Polygon};
use gw_common::SamplePoint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scatter `count` samples uniformly over a box with values following
/// the linear trend `value = 2*x + 3*y`.
///
/// An interpolated surface built from these samples can be checked
/// against the trend at any interior location.
pub fn linear_trend_samples(
    count: usize,
    x_range: (f64, f64),
    y_range: (f64, f64),
    seed: u64,
) -> Vec<SamplePoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x = rng.gen_range(x_range.0..x_range.1);
            let y = rng.gen_range(y_range.0..y_range.1);
            SamplePoint::new(x, y, linear_trend(x, y))
        })
        .collect()
}

/// The trend used by [`linear_trend_samples`].
pub fn linear_trend(x: f64, y: f64) -> f64 {
    2.0 * x + 3.0 * y
}

/// Wells clustered around a handful of villages: a few tight groups
/// with constant-ish values per group, the worst case for quantile
/// classification and triangulation.
pub fn clustered_samples(clusters: usize, per_cluster: usize, seed: u64) -> Vec<SamplePoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = Vec::with_capacity(clusters * per_cluster);
    for c in 0..clusters {
        let cx = 77.0 + rng.gen_range(0.0..0.8);
        let cy = 14.0 + rng.gen_range(0.0..0.8);
        let base_value = 10.0 * (c + 1) as f64;
        for _ in 0..per_cluster {
            samples.push(SamplePoint::new(
                cx + rng.gen_range(-0.02..0.02),
                cy + rng.gen_range(-0.02..0.02),
                base_value + rng.gen_range(-0.5..0.5),
            ));
        }
    }
    samples
}

/// An axis-aligned square boundary polygon.
pub fn square_boundary(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    polygon![
        (x: min_x, y: min_y),
        (x: max_x, y: min_y),
        (x: max_x, y: max_y),
        (x: min_x, y: max_y),
    ]
}
