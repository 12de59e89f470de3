//! Point and bounding-box transformations between supported CRS codes.

use crate::utm::TransverseMercator;
use crate::ProjectionError;
use gw_common::{BoundingBox, CrsCode};

/// A transformation between two supported coordinate reference systems.
#[derive(Debug, Clone)]
pub struct CoordTransformer {
    from: CrsCode,
    to: CrsCode,
    kind: TransformKind,
}

#[derive(Debug, Clone)]
enum TransformKind {
    Identity,
    GeoToUtm(TransverseMercator),
    UtmToGeo(TransverseMercator),
}

impl CoordTransformer {
    /// Build a transformer between two CRS codes.
    ///
    /// UTM-to-UTM transformations between different zones are not needed
    /// by the pipeline and are rejected.
    pub fn between(from: CrsCode, to: CrsCode) -> Result<Self, ProjectionError> {
        let kind = match (from, to) {
            (a, b) if a == b => TransformKind::Identity,
            (CrsCode::Epsg4326, CrsCode::Utm { zone, north }) => {
                TransformKind::GeoToUtm(TransverseMercator::utm(zone, north))
            }
            (CrsCode::Utm { zone, north }, CrsCode::Epsg4326) => {
                TransformKind::UtmToGeo(TransverseMercator::utm(zone, north))
            }
            (a, b) => {
                return Err(ProjectionError::UnsupportedTransform {
                    from: a.to_string(),
                    to: b.to_string(),
                })
            }
        };
        Ok(Self { from, to, kind })
    }

    pub fn from_crs(&self) -> CrsCode {
        self.from
    }

    pub fn to_crs(&self) -> CrsCode {
        self.to
    }

    /// Transform a single (x, y) coordinate pair.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        match &self.kind {
            TransformKind::Identity => Ok((x, y)),
            TransformKind::GeoToUtm(tm) => tm.forward(x, y),
            TransformKind::UtmToGeo(tm) => Ok(tm.inverse(x, y)),
        }
    }

    /// Inverse of this transformer.
    pub fn inverted(&self) -> CoordTransformer {
        let kind = match &self.kind {
            TransformKind::Identity => TransformKind::Identity,
            TransformKind::GeoToUtm(tm) => TransformKind::UtmToGeo(tm.clone()),
            TransformKind::UtmToGeo(tm) => TransformKind::GeoToUtm(tm.clone()),
        };
        CoordTransformer {
            from: self.to,
            to: self.from,
            kind,
        }
    }
}

/// Transform a bounding box by sampling its edges.
///
/// Projected edges of a geographic box are curved, so corners alone
/// underestimate the extent. 21 samples per edge keeps the error far
/// below one pixel at the resolutions the pipeline uses.
pub fn transform_bbox(
    transformer: &CoordTransformer,
    bbox: &BoundingBox,
) -> Result<BoundingBox, ProjectionError> {
    const EDGE_SAMPLES: usize = 20;

    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;

    for t in 0..=EDGE_SAMPLES {
        let frac = t as f64 / EDGE_SAMPLES as f64;
        let x = bbox.min_x + frac * bbox.width();
        let y = bbox.min_y + frac * bbox.height();

        for (px, py) in [
            (x, bbox.min_y),
            (x, bbox.max_y),
            (bbox.min_x, y),
            (bbox.max_x, y),
        ] {
            let (tx, ty) = transformer.transform(px, py)?;
            min_x = min_x.min(tx);
            min_y = min_y.min(ty);
            max_x = max_x.max(tx);
            max_y = max_y.max(ty);
        }
    }

    Ok(BoundingBox::new(min_x, min_y, max_x, max_y))
}
