//! Polyline smoothing.

/// 3-point centered moving average over the interior points of a line.
/// Endpoints stay fixed so closed rings keep their seam and open lines
/// keep their extents.
pub fn smooth_line(coords: &mut Vec<(f64, f64)>) {
    if coords.len() < 3 {
        return;
    }

    let original = coords.clone();
    for i in 1..coords.len() - 1 {
        let (px, py) = original[i - 1];
        let (cx, cy) = original[i];
        let (nx, ny) = original[i + 1];
        coords[i] = ((px + cx + nx) / 3.0, (py + cy + ny) / 3.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_unchanged() {
        let mut line = vec![(0.0, 0.0), (1.0, 5.0), (2.0, 0.0), (3.0, 5.0), (4.0, 0.0)];
        let first = line[0];
        let last = line[4];
        smooth_line(&mut line);
        assert_eq!(line[0], first);
        assert_eq!(line[4], last);
    }

    #[test]
    fn test_interior_averaged_from_original() {
        let mut line = vec![(0.0, 0.0), (3.0, 0.0), (6.0, 9.0), (9.0, 0.0)];
        smooth_line(&mut line);
        assert_eq!(line[1], (3.0, 3.0));
        // Averaged against the pre-pass neighbors, not the smoothed ones
        assert_eq!(line[2], (6.0, 3.0));
    }

    #[test]
    fn test_short_lines_untouched() {
        let mut line = vec![(0.0, 0.0), (1.0, 1.0)];
        smooth_line(&mut line);
        assert_eq!(line, vec![(0.0, 0.0), (1.0, 1.0)]);
    }

    #[test]
    fn test_straight_line_fixed_point() {
        let mut line: Vec<(f64, f64)> = (0..6).map(|i| (i as f64, 2.0 * i as f64)).collect();
        let before = line.clone();
        smooth_line(&mut line);
        for (a, b) in before.iter().zip(&line) {
            assert!((a.0 - b.0).abs() < 1e-12 && (a.1 - b.1).abs() < 1e-12);
        }
    }
}
