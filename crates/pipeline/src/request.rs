//! Request validation.
//!
//! Raw payloads are validated in one pass into a typed request before
//! any pipeline stage runs, so a bad parameter can never leave partial
//! side effects.

use crate::error::{PipelineError, Result};
use interpolation::Method;
use serde::Deserialize;

/// Unvalidated payload as received from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRequest {
    pub method: String,
    pub field: String,
    pub boundary_ids: Vec<String>,
    #[serde(default)]
    pub create_colored: bool,
    #[serde(default)]
    pub generate_contours: bool,
    #[serde(default)]
    pub contour_interval: Option<f64>,
    #[serde(default)]
    pub idw_power: Option<f64>,
    #[serde(default)]
    pub idw_radius: Option<f64>,
}

/// A fully validated interpolation request.
#[derive(Debug, Clone)]
pub struct InterpolationRequest {
    pub method: Method,
    pub field: String,
    pub boundary_ids: Vec<String>,
    pub create_colored: bool,
    pub contours: Option<ContourOptions>,
}

#[derive(Debug, Clone, Copy)]
pub struct ContourOptions {
    pub interval: Option<f64>,
    pub smooth: bool,
}

impl RawRequest {
    pub fn validate(self) -> Result<InterpolationRequest> {
        let method = Method::parse(&self.method, self.idw_power, self.idw_radius)
            .map_err(|e| PipelineError::InvalidRequest(e.to_string()))?;

        let field = self.field.trim().to_string();
        if field.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "field name must not be empty".to_string(),
            ));
        }

        let boundary_ids: Vec<String> = self
            .boundary_ids
            .iter()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        if boundary_ids.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "at least one boundary id is required".to_string(),
            ));
        }

        if let Some(interval) = self.contour_interval {
            if interval <= 0.0 || !interval.is_finite() {
                return Err(PipelineError::InvalidRequest(format!(
                    "contour interval must be positive, got {interval}"
                )));
            }
        }
        let contours = if self.generate_contours || self.contour_interval.is_some() {
            Some(ContourOptions {
                interval: self.contour_interval,
                smooth: true,
            })
        } else {
            None
        };

        Ok(InterpolationRequest {
            method,
            field,
            boundary_ids,
            create_colored: self.create_colored,
            contours,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interpolation::IdwParams;

    fn raw(json: &str) -> RawRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_minimal_request() {
        let request = raw(r#"{
            "method": "idw",
            "field": "water_level",
            "boundary_ids": ["D-501"]
        }"#)
        .validate()
        .unwrap();

        assert_eq!(request.method, Method::Idw(IdwParams::default()));
        assert_eq!(request.field, "water_level");
        assert!(!request.create_colored);
        assert!(request.contours.is_none());
    }

    #[test]
    fn test_interval_implies_contours() {
        let request = raw(r#"{
            "method": "spline",
            "field": "water_level",
            "boundary_ids": ["D-501", "D-502"],
            "contour_interval": 5.0
        }"#)
        .validate()
        .unwrap();

        let contours = request.contours.unwrap();
        assert_eq!(contours.interval, Some(5.0));
    }

    #[test]
    fn test_kriging_maps_to_rbf() {
        let request = raw(r#"{
            "method": "kriging",
            "field": "water_level",
            "boundary_ids": ["D-501"]
        }"#)
        .validate()
        .unwrap();
        assert_eq!(request.method, Method::Rbf);
    }

    #[test]
    fn test_rejections() {
        assert!(raw(r#"{"method": "nearest", "field": "f", "boundary_ids": ["a"]}"#)
            .validate()
            .is_err());
        assert!(raw(r#"{"method": "idw", "field": "  ", "boundary_ids": ["a"]}"#)
            .validate()
            .is_err());
        assert!(raw(r#"{"method": "idw", "field": "f", "boundary_ids": ["", "  "]}"#)
            .validate()
            .is_err());
        assert!(raw(
            r#"{"method": "idw", "field": "f", "boundary_ids": ["a"], "contour_interval": -1.0}"#
        )
        .validate()
        .is_err());
    }
}
