//! Coordinate Reference System codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// CRS codes handled by the surface pipeline.
///
/// Interpolation always runs in WGS84; published rasters are reprojected
/// to a UTM zone (EPSG:32644 for the assessment area by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// WGS84 UTM zone (meters)
    Utm { zone: u8, north: bool },
}

impl CrsCode {
    /// UTM zone 44N, the projected CRS of the assessment area.
    pub const UTM_44N: CrsCode = CrsCode::Utm {
        zone: 44,
        north: true,
    };

    /// Parse an "EPSG:nnnn" style string.
    pub fn from_epsg_string(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.to_uppercase();
        let code = normalized
            .strip_prefix("EPSG:")
            .and_then(|c| c.parse::<u32>().ok())
            .ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))?;
        Self::from_epsg(code).ok_or_else(|| CrsParseError::UnsupportedCrs(s.to_string()))
    }

    /// Build from a numeric EPSG code, if it is one we support.
    pub fn from_epsg(code: u32) -> Option<Self> {
        match code {
            4326 => Some(CrsCode::Epsg4326),
            32601..=32660 => Some(CrsCode::Utm {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Some(CrsCode::Utm {
                zone: (code - 32700) as u8,
                north: false,
            }),
            _ => None,
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Utm { zone, north: true } => 32600 + *zone as u32,
            CrsCode::Utm { zone, north: false } => 32700 + *zone as u32,
        }
    }

    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(
            CrsCode::from_epsg_string("EPSG:4326").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_epsg_string("epsg:32644").unwrap(),
            CrsCode::UTM_44N
        );
        assert!(CrsCode::from_epsg_string("EPSG:99999").is_err());
        assert!(CrsCode::from_epsg_string("utm44").is_err());
    }

    #[test]
    fn test_epsg_roundtrip() {
        assert_eq!(CrsCode::UTM_44N.epsg(), 32644);
        assert_eq!(CrsCode::from_epsg(32644), Some(CrsCode::UTM_44N));
        assert_eq!(
            CrsCode::from_epsg(32733),
            Some(CrsCode::Utm {
                zone: 33,
                north: false
            })
        );
        assert_eq!(CrsCode::UTM_44N.to_string(), "EPSG:32644");
    }

    #[test]
    fn test_is_geographic() {
        assert!(CrsCode::Epsg4326.is_geographic());
        assert!(!CrsCode::UTM_44N.is_geographic());
    }
}
