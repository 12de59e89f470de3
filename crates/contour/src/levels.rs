//! Iso-level selection.

use crate::error::ContourError;

/// Choose the contour levels for a data range.
///
/// Without an interval, nine evenly spaced interior levels are generated
/// between min and max, endpoints excluded. With an interval, levels sit
/// on multiples of the interval inside the range; an interval wider than
/// the range degrades to a single level at the mean.
pub fn contour_levels(
    min: f64,
    max: f64,
    mean: f64,
    interval: Option<f64>,
) -> Result<Vec<f64>, ContourError> {
    let interval = match interval {
        None => {
            let levels = (1..=9)
                .map(|i| min + (max - min) * i as f64 / 10.0)
                .collect();
            return Ok(levels);
        }
        Some(i) if i <= 0.0 || !i.is_finite() => return Err(ContourError::InvalidInterval(i)),
        Some(i) => i,
    };

    let first = (min / interval).ceil() * interval;
    let last = (max / interval).floor() * interval;
    if first > last {
        return Ok(vec![mean]);
    }

    let count = ((last - first) / interval).round() as usize;
    Ok((0..=count).map(|i| first + i as f64 * interval).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_levels_on_multiples() {
        let levels = contour_levels(12.0, 47.0, 29.5, Some(10.0)).unwrap();
        assert_eq!(levels, vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_auto_levels_nine_interior() {
        let levels = contour_levels(0.0, 100.0, 50.0, None).unwrap();
        assert_eq!(levels.len(), 9);
        for (i, level) in levels.iter().enumerate() {
            assert!((level - 10.0 * (i + 1) as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_wide_interval_falls_back_to_mean() {
        let levels = contour_levels(12.0, 18.0, 15.0, Some(100.0)).unwrap();
        assert_eq!(levels, vec![15.0]);
    }

    #[test]
    fn test_exact_multiples_included() {
        let levels = contour_levels(10.0, 30.0, 20.0, Some(10.0)).unwrap();
        assert_eq!(levels, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_nonpositive_interval_rejected() {
        assert!(contour_levels(0.0, 10.0, 5.0, Some(0.0)).is_err());
        assert!(contour_levels(0.0, 10.0, 5.0, Some(-2.0)).is_err());
    }
}
