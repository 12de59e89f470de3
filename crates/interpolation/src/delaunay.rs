//! Delaunay triangulation via incremental insertion (Bowyer-Watson).

use crate::error::InterpolationError;

/// A triangle as three indices into the input point slice,
/// counter-clockwise.
pub type TriangleIndices = [usize; 3];

#[derive(Debug, Clone)]
struct Triangle {
    v: [usize; 3],
    /// Circumcenter
    cx: f64,
    cy: f64,
    /// Squared circumradius; infinite for degenerate triangles so they
    /// are always re-examined.
    rr: f64,
}

/// Triangulate a scattered point set.
///
/// Needs at least three non-collinear points; exact duplicates are
/// tolerated (the duplicate simply produces no new triangles).
pub fn triangulate(points: &[(f64, f64)]) -> Result<Vec<TriangleIndices>, InterpolationError> {
    if points.len() < 3 {
        return Err(InterpolationError::InsufficientSamples {
            method: "triangulation",
            needed: 3,
            got: points.len(),
        });
    }

    // Super-triangle comfortably containing every input point.
    let (min_x, min_y, max_x, max_y) = points.iter().fold(
        (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
        |(ax, ay, bx, by), &(x, y)| (ax.min(x), ay.min(y), bx.max(x), by.max(y)),
    );
    let span = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;

    let n = points.len();
    let mut verts: Vec<(f64, f64)> = points.to_vec();
    verts.push((mid_x - 20.0 * span, mid_y - 10.0 * span));
    verts.push((mid_x + 20.0 * span, mid_y - 10.0 * span));
    verts.push((mid_x, mid_y + 20.0 * span));

    let mut triangles = vec![make_triangle(&verts, [n, n + 1, n + 2])];

    for p in 0..n {
        let (px, py) = verts[p];

        // Triangles whose circumcircle contains the new point
        let mut bad = Vec::new();
        for (i, t) in triangles.iter().enumerate() {
            let dx = px - t.cx;
            let dy = py - t.cy;
            if dx * dx + dy * dy <= t.rr * (1.0 + 1e-12) {
                bad.push(i);
            }
        }

        // Boundary of the cavity: edges belonging to exactly one bad triangle
        let mut edges: Vec<(usize, usize)> = Vec::new();
        for &i in &bad {
            let [a, b, c] = triangles[i].v;
            for edge in [(a, b), (b, c), (c, a)] {
                if let Some(pos) = edges
                    .iter()
                    .position(|&(x, y)| (x, y) == (edge.1, edge.0) || (x, y) == edge)
                {
                    edges.swap_remove(pos);
                } else {
                    edges.push(edge);
                }
            }
        }

        for &i in bad.iter().rev() {
            triangles.swap_remove(i);
        }

        for (a, b) in edges {
            // Duplicate of an existing vertex; produces a zero-area cavity
            if verts[a] == (px, py) || verts[b] == (px, py) {
                continue;
            }
            triangles.push(make_triangle(&verts, [a, b, p]));
        }
    }

    let result: Vec<TriangleIndices> = triangles
        .into_iter()
        .filter(|t| t.v.iter().all(|&v| v < n))
        .map(|t| orient_ccw(points, t.v))
        .collect();

    if result.is_empty() {
        return Err(InterpolationError::Triangulation(
            "points are collinear or coincident".to_string(),
        ));
    }

    Ok(result)
}

fn make_triangle(verts: &[(f64, f64)], v: [usize; 3]) -> Triangle {
    let (ax, ay) = verts[v[0]];
    let (bx, by) = verts[v[1]];
    let (cx, cy) = verts[v[2]];

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < 1e-30 {
        return Triangle {
            v,
            cx: 0.0,
            cy: 0.0,
            rr: f64::INFINITY,
        };
    }

    let aa = ax * ax + ay * ay;
    let bb = bx * bx + by * by;
    let cc = cx * cx + cy * cy;
    let ux = (aa * (by - cy) + bb * (cy - ay) + cc * (ay - by)) / d;
    let uy = (aa * (cx - bx) + bb * (ax - cx) + cc * (bx - ax)) / d;
    let rr = (ax - ux) * (ax - ux) + (ay - uy) * (ay - uy);

    Triangle {
        v,
        cx: ux,
        cy: uy,
        rr,
    }
}

fn orient_ccw(points: &[(f64, f64)], v: [usize; 3]) -> TriangleIndices {
    let (ax, ay) = points[v[0]];
    let (bx, by) = points[v[1]];
    let (cx, cy) = points[v[2]];
    if (bx - ax) * (cy - ay) - (by - ay) * (cx - ax) < 0.0 {
        [v[0], v[2], v[1]]
    } else {
        v
    }
}

/// Barycentric coordinates of (x, y) in the triangle (a, b, c), or None
/// for a degenerate triangle.
pub fn barycentric(
    a: (f64, f64),
    b: (f64, f64),
    c: (f64, f64),
    x: f64,
    y: f64,
) -> Option<(f64, f64, f64)> {
    let det = (b.1 - c.1) * (a.0 - c.0) + (c.0 - b.0) * (a.1 - c.1);
    if det.abs() < 1e-30 {
        return None;
    }
    let u = ((b.1 - c.1) * (x - c.0) + (c.0 - b.0) * (y - c.1)) / det;
    let v = ((c.1 - a.1) * (x - c.0) + (a.0 - c.0) * (y - c.1)) / det;
    Some((u, v, 1.0 - u - v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_produces_two_triangles() {
        let pts = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let tris = triangulate(&pts).unwrap();
        assert_eq!(tris.len(), 2);

        // Every input vertex is used
        let mut used = [false; 4];
        for t in &tris {
            for &v in t {
                used[v] = true;
            }
        }
        assert!(used.iter().all(|&u| u));
    }

    #[test]
    fn test_delaunay_property_random_points() {
        // Fixed pseudo-random scatter; every circumcircle must be empty
        let mut pts = Vec::new();
        let mut seed = 42u64;
        for _ in 0..40 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let x = (seed >> 33) as f64 / (1u64 << 31) as f64;
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let y = (seed >> 33) as f64 / (1u64 << 31) as f64;
            pts.push((x, y));
        }

        let tris = triangulate(&pts).unwrap();
        for t in &tris {
            let tri = make_triangle(&pts, *t);
            for (i, &(px, py)) in pts.iter().enumerate() {
                if t.contains(&i) {
                    continue;
                }
                let dx = px - tri.cx;
                let dy = py - tri.cy;
                assert!(
                    dx * dx + dy * dy >= tri.rr * (1.0 - 1e-9),
                    "point {i} inside circumcircle of {t:?}"
                );
            }
        }
    }

    #[test]
    fn test_collinear_points_rejected() {
        let pts = vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)];
        assert!(triangulate(&pts).is_err());
    }

    #[test]
    fn test_too_few_points() {
        assert!(triangulate(&[(0.0, 0.0), (1.0, 0.0)]).is_err());
    }

    #[test]
    fn test_barycentric_inside_and_outside() {
        let a = (0.0, 0.0);
        let b = (1.0, 0.0);
        let c = (0.0, 1.0);

        let (u, v, w) = barycentric(a, b, c, 0.25, 0.25).unwrap();
        assert!(u > 0.0 && v > 0.0 && w > 0.0);
        assert!((u + v + w - 1.0).abs() < 1e-12);

        let (u, v, w) = barycentric(a, b, c, 2.0, 2.0).unwrap();
        assert!(u < 0.0 || v < 0.0 || w < 0.0);
    }
}
