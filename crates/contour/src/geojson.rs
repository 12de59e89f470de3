//! GeoJSON packaging of contour sets.

use crate::trace::ContourSet;
use serde::Serialize;

/// GeoJSON FeatureCollection of contour line features.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
    pub properties: CollectionProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: LineStringGeometry,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineStringGeometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureProperties {
    pub level: f64,
    /// Duplicate of `level` kept for map clients labeling by elevation.
    pub elevation: f64,
    pub contour_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionProperties {
    pub statistics: Statistics,
    pub generated_from: String,
    pub generation_method: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total_contours: usize,
    pub contour_levels: Vec<f64>,
    pub elevation_range: ElevationRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contour_interval: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElevationRange {
    pub min: f64,
    pub max: f64,
}

/// Build the feature collection for an extracted contour set.
pub fn feature_collection(set: &ContourSet, field: &str, method: &str) -> FeatureCollection {
    let features = set
        .lines
        .iter()
        .map(|line| Feature {
            kind: "Feature",
            geometry: LineStringGeometry {
                kind: "LineString",
                coordinates: line.coords.iter().map(|&(x, y)| [x, y]).collect(),
            },
            properties: FeatureProperties {
                level: line.level,
                elevation: line.level,
                contour_id: format!("contour_{:.2}_{}", line.level, line.index),
                interval: set.interval,
            },
        })
        .collect();

    // Only levels that actually traced something, sorted and deduped
    let mut contour_levels: Vec<f64> = set.lines.iter().map(|l| l.level).collect();
    contour_levels.sort_by(f64::total_cmp);
    contour_levels.dedup();

    FeatureCollection {
        kind: "FeatureCollection",
        features,
        properties: CollectionProperties {
            statistics: Statistics {
                total_contours: set.lines.len(),
                contour_levels,
                elevation_range: ElevationRange {
                    min: set.min,
                    max: set.max,
                },
                contour_interval: set.interval,
            },
            generated_from: field.to_string(),
            generation_method: method.to_string(),
        },
    }
}
