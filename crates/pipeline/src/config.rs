//! Pipeline configuration.
//!
//! All settings are injected through one structure passed to the
//! orchestrator at construction; nothing reads process-wide state after
//! startup.

use crate::error::{PipelineError, Result};
use gw_common::grid::DEFAULT_RESOLUTION_DEG;
use gw_common::CrsCode;
use raster::DEFAULT_TARGET_RESOLUTION;
use serde::Deserialize;
use std::path::PathBuf;

/// Settings for one pipeline instance.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub geoserver: GeoServerConfig,
    /// Directory for transient raster artifacts.
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    /// Interpolation grid spacing in degrees.
    #[serde(default = "default_grid_resolution")]
    pub grid_resolution: f64,
    /// CRS of the published rasters.
    #[serde(default = "default_target_crs")]
    pub target_crs: CrsCode,
    /// Published raster ground resolution in the target CRS's unit.
    #[serde(default = "default_target_resolution")]
    pub target_resolution: f64,
}

/// Publishing sink connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GeoServerConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_workspace")]
    pub workspace: String,
}

fn default_working_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_grid_resolution() -> f64 {
    DEFAULT_RESOLUTION_DEG
}

fn default_target_crs() -> CrsCode {
    CrsCode::UTM_44N
}

fn default_target_resolution() -> f64 {
    DEFAULT_TARGET_RESOLUTION
}

fn default_workspace() -> String {
    "groundwater".to_string()
}

impl PipelineConfig {
    /// Read settings from the environment. `GEOSERVER_URL`,
    /// `GEOSERVER_USER` and `GEOSERVER_PASSWORD` are required; the rest
    /// fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let require = |key: &str| {
            std::env::var(key).map_err(|_| PipelineError::Config(format!("{key} is not set")))
        };

        let grid_resolution = match std::env::var("GRID_RESOLUTION_DEG") {
            Ok(v) => v
                .parse::<f64>()
                .map_err(|e| PipelineError::Config(format!("GRID_RESOLUTION_DEG: {e}")))?,
            Err(_) => DEFAULT_RESOLUTION_DEG,
        };
        let target_crs = match std::env::var("TARGET_CRS") {
            Ok(v) => CrsCode::from_epsg_string(&v)
                .map_err(|e| PipelineError::Config(e.to_string()))?,
            Err(_) => CrsCode::UTM_44N,
        };

        Ok(Self {
            geoserver: GeoServerConfig {
                base_url: require("GEOSERVER_URL")?,
                username: require("GEOSERVER_USER")?,
                password: require("GEOSERVER_PASSWORD")?,
                workspace: std::env::var("GEOSERVER_WORKSPACE")
                    .unwrap_or_else(|_| default_workspace()),
            },
            working_dir: std::env::var("PIPELINE_WORKING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_working_dir()),
            grid_resolution,
            target_crs,
            target_resolution: DEFAULT_TARGET_RESOLUTION,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_resolution <= 0.0 || !self.grid_resolution.is_finite() {
            return Err(PipelineError::Config(format!(
                "grid resolution must be positive, got {}",
                self.grid_resolution
            )));
        }
        if self.target_resolution <= 0.0 || !self.target_resolution.is_finite() {
            return Err(PipelineError::Config(format!(
                "target resolution must be positive, got {}",
                self.target_resolution
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_defaults() {
        let json = r#"{
            "geoserver": {
                "base_url": "http://localhost:8080/geoserver",
                "username": "admin",
                "password": "s3cret"
            }
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.geoserver.workspace, "groundwater");
        assert_eq!(config.grid_resolution, DEFAULT_RESOLUTION_DEG);
        assert_eq!(config.target_crs, CrsCode::UTM_44N);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_resolution() {
        let json = r#"{
            "geoserver": {
                "base_url": "http://localhost:8080/geoserver",
                "username": "admin",
                "password": "s3cret"
            },
            "grid_resolution": -0.5
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }
}
