//! GeoServer publishing sink.
//!
//! Publishes a GeoTIFF as a coverage store via the REST API: the
//! workspace is created on first use, then the file is PUT into
//! `coveragestores/{store}/file.geotiff`, which also (re)creates the
//! layer of the same name.

use crate::config::GeoServerConfig;
use crate::error::{PipelineError, Result};
use crate::sources::PublishSink;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub struct GeoServerSink {
    config: GeoServerConfig,
    client: Client,
}

impl GeoServerSink {
    pub fn new(config: GeoServerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self { config, client })
    }

    fn rest_url(&self, tail: &str) -> String {
        format!(
            "{}/rest/{}",
            self.config.base_url.trim_end_matches('/'),
            tail
        )
    }

    /// Create the workspace unless it already exists.
    fn ensure_workspace(&self) -> Result<()> {
        let url = self.rest_url(&format!("workspaces/{}", self.config.workspace));
        let status = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()?
            .status();

        if status.is_success() {
            return Ok(());
        }
        if status != StatusCode::NOT_FOUND {
            return Err(PipelineError::Publish(format!(
                "workspace lookup returned {status}"
            )));
        }

        debug!(workspace = %self.config.workspace, "creating workspace");
        let response = self
            .client
            .post(self.rest_url("workspaces"))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Content-Type", "application/json")
            .body(format!(
                r#"{{"workspace": {{"name": "{}"}}}}"#,
                self.config.workspace
            ))
            .send()?;
        if !response.status().is_success() {
            return Err(PipelineError::Publish(format!(
                "workspace creation returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

impl PublishSink for GeoServerSink {
    fn publish_raster(&self, layer: &str, path: &Path) -> Result<()> {
        self.ensure_workspace()?;

        let bytes = std::fs::read(path)?;
        let url = self.rest_url(&format!(
            "workspaces/{}/coveragestores/{}/file.geotiff",
            self.config.workspace, layer
        ));

        let response = self
            .client
            .put(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Content-Type", "image/tiff")
            .body(bytes)
            .send()?;

        if !response.status().is_success() {
            return Err(PipelineError::Publish(format!(
                "coverage upload for '{layer}' returned {}",
                response.status()
            )));
        }
        info!(layer, workspace = %self.config.workspace, "published raster layer");
        Ok(())
    }
}
