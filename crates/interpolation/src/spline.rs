//! Triangulated spline interpolation.
//!
//! Triangulates the samples, then evaluates a cubic Bezier patch per
//! triangle with vertex gradients fitted by least squares. Cells outside
//! the convex hull stay NaN. When the cubic surface leaves more than
//! half the grid unset, the estimate falls back to plain barycentric
//! interpolation over the same triangulation.

use crate::delaunay::{barycentric, triangulate, TriangleIndices};
use crate::error::InterpolationError;
use gw_common::{SamplePoint, SurfaceGrid};
use tracing::warn;

/// Fraction of NaN cells above which the cubic result is discarded.
const MAX_NAN_FRACTION: f64 = 0.5;

/// Interpolate scattered samples onto the grid with a triangulated
/// spline. Returns values in row-major order, row 0 at the northern
/// edge; cells outside the sample hull are NaN.
pub fn interpolate_spline(
    samples: &[SamplePoint],
    grid: &SurfaceGrid,
) -> Result<Vec<f64>, InterpolationError> {
    if samples.len() < 3 {
        return Err(InterpolationError::InsufficientSamples {
            method: "spline",
            needed: 3,
            got: samples.len(),
        });
    }

    let points: Vec<(f64, f64)> = samples.iter().map(|s| (s.x, s.y)).collect();
    let values: Vec<f64> = samples.iter().map(|s| s.value).collect();
    let tris = triangulate(&points)?;

    let gradients = vertex_gradients(&points, &values, &tris);
    let cubic = fill(grid, &points, &tris, |tri, u, v, w| {
        eval_cubic(&points, &values, &gradients, tri, u, v, w)
    });

    let nan_fraction =
        cubic.iter().filter(|v| v.is_nan()).count() as f64 / cubic.len().max(1) as f64;
    if nan_fraction <= MAX_NAN_FRACTION {
        return Ok(cubic);
    }

    warn!(
        nan_fraction = format!("{:.2}", nan_fraction),
        "cubic surface left most of the grid unset, using linear fallback"
    );
    Ok(fill(grid, &points, &tris, |tri, u, v, w| {
        u * values[tri[0]] + v * values[tri[1]] + w * values[tri[2]]
    }))
}

/// Rasterize every triangle onto the grid, evaluating `f` at each
/// covered cell center with barycentric coordinates.
fn fill<F>(
    grid: &SurfaceGrid,
    points: &[(f64, f64)],
    tris: &[TriangleIndices],
    f: F,
) -> Vec<f64>
where
    F: Fn(&TriangleIndices, f64, f64, f64) -> f64,
{
    let mut out = vec![f64::NAN; grid.len()];
    let res = grid.resolution;
    let y_top = grid.y_top();

    for tri in tris {
        let a = points[tri[0]];
        let b = points[tri[1]];
        let c = points[tri[2]];

        let min_x = a.0.min(b.0).min(c.0);
        let max_x = a.0.max(b.0).max(c.0);
        let min_y = a.1.min(b.1).min(c.1);
        let max_y = a.1.max(b.1).max(c.1);

        let col_start = (((min_x - grid.x_min) / res).ceil().max(0.0)) as usize;
        let col_end = (((max_x - grid.x_min) / res).floor()).min(grid.width as f64 - 1.0);
        let row_start = (((y_top - max_y) / res).ceil().max(0.0)) as usize;
        let row_end = (((y_top - min_y) / res).floor()).min(grid.height as f64 - 1.0);
        if col_end < 0.0 || row_end < 0.0 {
            continue;
        }

        for row in row_start..=row_end as usize {
            let y = grid.y_coord(row);
            for col in col_start..=col_end as usize {
                let x = grid.x_coord(col);
                if let Some((u, v, w)) = barycentric(a, b, c, x, y) {
                    if u >= -1e-9 && v >= -1e-9 && w >= -1e-9 {
                        out[row * grid.width + col] = f(tri, u, v, w);
                    }
                }
            }
        }
    }

    out
}

/// Per-vertex surface gradients from a least-squares plane over the
/// triangulation neighbors. Vertices with too few usable neighbors get
/// a flat gradient.
fn vertex_gradients(
    points: &[(f64, f64)],
    values: &[f64],
    tris: &[TriangleIndices],
) -> Vec<(f64, f64)> {
    let n = points.len();
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for tri in tris {
        for (i, j) in [(0, 1), (1, 2), (2, 0)] {
            let (a, b) = (tri[i], tri[j]);
            if !neighbors[a].contains(&b) {
                neighbors[a].push(b);
            }
            if !neighbors[b].contains(&a) {
                neighbors[b].push(a);
            }
        }
    }

    let mut gradients = vec![(0.0, 0.0); n];
    for i in 0..n {
        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        let mut sxz = 0.0;
        let mut syz = 0.0;
        for &j in &neighbors[i] {
            let dx = points[j].0 - points[i].0;
            let dy = points[j].1 - points[i].1;
            let dz = values[j] - values[i];
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
            sxz += dx * dz;
            syz += dy * dz;
        }
        let det = sxx * syy - sxy * sxy;
        if det.abs() > 1e-30 {
            gradients[i] = ((syy * sxz - sxy * syz) / det, (sxx * syz - sxy * sxz) / det);
        }
    }

    gradients
}

/// Cubic Bezier triangle matching values and fitted gradients at the
/// vertices.
#[allow(clippy::too_many_arguments)]
fn eval_cubic(
    points: &[(f64, f64)],
    values: &[f64],
    gradients: &[(f64, f64)],
    tri: &TriangleIndices,
    u: f64,
    v: f64,
    w: f64,
) -> f64 {
    let [i0, i1, i2] = *tri;
    let (p0, p1, p2) = (points[i0], points[i1], points[i2]);
    let (z0, z1, z2) = (values[i0], values[i1], values[i2]);
    let (g0, g1, g2) = (gradients[i0], gradients[i1], gradients[i2]);

    let edge = |z: f64, g: (f64, f64), from: (f64, f64), to: (f64, f64)| {
        z + (g.0 * (to.0 - from.0) + g.1 * (to.1 - from.1)) / 3.0
    };

    let b210 = edge(z0, g0, p0, p1);
    let b201 = edge(z0, g0, p0, p2);
    let b120 = edge(z1, g1, p1, p0);
    let b021 = edge(z1, g1, p1, p2);
    let b102 = edge(z2, g2, p2, p0);
    let b012 = edge(z2, g2, p2, p1);

    let e = (b210 + b201 + b120 + b021 + b102 + b012) / 6.0;
    let vbar = (z0 + z1 + z2) / 3.0;
    let b111 = e + (e - vbar) / 2.0;

    z0 * u * u * u
        + z1 * v * v * v
        + z2 * w * w * w
        + 3.0 * b210 * u * u * v
        + 3.0 * b201 * u * u * w
        + 3.0 * b120 * u * v * v
        + 3.0 * b021 * v * v * w
        + 3.0 * b102 * u * w * w
        + 3.0 * b012 * v * w * w
        + 6.0 * b111 * u * v * w
}
