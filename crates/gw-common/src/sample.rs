//! Scattered point measurements (well readings).

use crate::{BoundingBox, GwError, GwResult};
use serde::{Deserialize, Serialize};

/// A single measurement at a geographic location.
///
/// `x` is longitude and `y` is latitude (WGS84 degrees); `value` is the
/// measured quantity for the requested field (water level, elevation, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }
}

/// Validate a sample collection: non-empty, all coordinates and values finite.
pub fn validate_samples(samples: &[SamplePoint]) -> GwResult<()> {
    if samples.is_empty() {
        return Err(GwError::EmptySamples(
            "no measurements available for the requested field".to_string(),
        ));
    }

    for (index, s) in samples.iter().enumerate() {
        if !s.x.is_finite() || !s.y.is_finite() {
            return Err(GwError::InvalidSample {
                index,
                message: format!("non-finite coordinates ({}, {})", s.x, s.y),
            });
        }
        if !s.value.is_finite() {
            return Err(GwError::InvalidSample {
                index,
                message: "non-finite measurement value".to_string(),
            });
        }
    }

    Ok(())
}

/// Bounding box of a sample collection, or None when it is empty.
pub fn sample_extent(samples: &[SamplePoint]) -> Option<BoundingBox> {
    let first = samples.first()?;
    let mut bbox = BoundingBox::new(first.x, first.y, first.x, first.y);

    for s in &samples[1..] {
        bbox.min_x = bbox.min_x.min(s.x);
        bbox.min_y = bbox.min_y.min(s.y);
        bbox.max_x = bbox.max_x.max(s.x);
        bbox.max_y = bbox.max_y.max(s.y);
    }

    Some(bbox)
}
