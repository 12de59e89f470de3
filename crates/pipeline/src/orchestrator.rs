//! The per-request pipeline: grid, interpolation, classification,
//! raster I/O, clipping, reprojection, contours, publish.

use crate::artifacts::ArtifactRegistry;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::request::InterpolationRequest;
use crate::sources::{BoundarySource, PublishSink, SampleSource};
use contour::{extract_contours, feature_collection, FeatureCollection};
use geo::{BoundingRect, Polygon};
use gw_common::{sample_extent, validate_samples, BoundingBox, GwError, SurfaceGrid};
use interpolation::interpolate_surface;
use raster::{
    classify_quantile, clip_rgb, clip_scalar, palette_for_field, reproject_rgb, reproject_scalar,
    DecodedRaster, LegendEntry, ScalarRaster,
};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};
use uuid::Uuid;

/// Pipeline progress states, one per completed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Validating,
    GridBuilt,
    Interpolated,
    Classified,
    Written,
    Clipped,
    Reprojected,
    Contoured,
    Publishing,
    Done,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Validating => "validating",
            PipelineState::GridBuilt => "grid-built",
            PipelineState::Interpolated => "interpolated",
            PipelineState::Classified => "classified",
            PipelineState::Written => "written",
            PipelineState::Clipped => "clipped",
            PipelineState::Reprojected => "reprojected",
            PipelineState::Contoured => "contoured",
            PipelineState::Publishing => "publishing",
            PipelineState::Done => "done",
        };
        f.write_str(name)
    }
}

struct StateTracker {
    current: PipelineState,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            current: PipelineState::Validating,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        info!(from = %self.current, to = %next, "pipeline state");
        self.current = next;
    }
}

/// Summary statistics of the clipped surface.
#[derive(Debug, Clone, Serialize)]
pub struct SurfaceStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub valid_cells: usize,
    pub width: usize,
    pub height: usize,
}

impl SurfaceStatistics {
    fn from_raster(raster: &ScalarRaster) -> Result<Self> {
        let (min, max) = raster
            .value_range()
            .ok_or_else(|| PipelineError::Raster(raster::RasterError::NoFiniteCells))?;
        let valid_cells = raster.valid_count();
        let sum: f64 = raster
            .data
            .iter()
            .filter(|v| v.is_finite())
            .map(|&v| v as f64)
            .sum();
        let mean = sum / valid_cells as f64;
        let variance: f64 = raster
            .data
            .iter()
            .filter(|v| v.is_finite())
            .map(|&v| (v as f64 - mean).powi(2))
            .sum::<f64>()
            / valid_cells as f64;
        Ok(Self {
            min: min as f64,
            max: max as f64,
            mean,
            std: variance.sqrt(),
            valid_cells,
            width: raster.width,
            height: raster.height,
        })
    }
}

/// What a successful run hands back to the caller.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub layer: String,
    pub colored_layer: Option<String>,
    pub samples_used: usize,
    pub boundaries_used: usize,
    pub statistics: SurfaceStatistics,
    pub legend: Option<Vec<LegendEntry>>,
    pub contours: Option<FeatureCollection>,
}

/// Sequences one interpolation request end to end.
pub struct Orchestrator<S, B, P> {
    config: PipelineConfig,
    samples: S,
    boundaries: B,
    sink: P,
}

impl<S, B, P> Orchestrator<S, B, P>
where
    S: SampleSource,
    B: BoundarySource,
    P: PublishSink,
{
    pub fn new(config: PipelineConfig, samples: S, boundaries: B, sink: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            samples,
            boundaries,
            sink,
        })
    }

    /// Run the full pipeline for one request. Every artifact written
    /// along the way is removed before returning, on success and on
    /// failure alike.
    pub fn run(&self, request: &InterpolationRequest) -> Result<PipelineOutcome> {
        let mut artifacts = ArtifactRegistry::new();
        let result = self.execute(request, &mut artifacts);
        artifacts.cleanup();
        if let Err(e) = &result {
            error!(field = %request.field, method = %request.method, error = %e, "pipeline failed");
        }
        result
    }

    fn execute(
        &self,
        request: &InterpolationRequest,
        artifacts: &mut ArtifactRegistry,
    ) -> Result<PipelineOutcome> {
        let mut state = StateTracker::new();
        let run_id = Uuid::new_v4().simple().to_string();
        let name_for = |stage: &str| -> PathBuf {
            self.config.working_dir.join(format!(
                "gw_{}_{}_{}_{}.tif",
                request.field,
                request.method.name(),
                run_id,
                stage
            ))
        };

        // validating
        let samples = self
            .samples
            .samples_for_field(&request.field)
            .map_err(|e| match e {
                e @ PipelineError::SampleSource(_) => e,
                other => PipelineError::SampleSource(other.to_string()),
            })?;
        if samples.is_empty() {
            return Err(PipelineError::NoSamples(request.field.clone()));
        }
        validate_samples(&samples)?;

        let boundaries = self.boundaries.boundaries(&request.boundary_ids)?;
        if boundaries.is_empty() {
            return Err(PipelineError::NoBoundaries(request.boundary_ids.clone()));
        }

        // grid-built
        let samples_bbox = sample_extent(&samples)
            .ok_or_else(|| PipelineError::NoSamples(request.field.clone()))?;
        let boundary_bbox = boundary_extent(&boundaries)?;
        let grid = SurfaceGrid::cover(&samples_bbox, &boundary_bbox, self.config.grid_resolution)?;
        state.advance(PipelineState::GridBuilt);
        info!(
            width = grid.width,
            height = grid.height,
            samples = samples.len(),
            "built interpolation grid"
        );

        // interpolated
        let surface = interpolate_surface(&request.method, &samples, &grid)?;
        let scalar = ScalarRaster::from_surface(&surface, &grid);
        state.advance(PipelineState::Interpolated);

        // classified (optional branch)
        let classified = if request.create_colored {
            let c = classify_quantile(&scalar, palette_for_field(&request.field), None)?;
            state.advance(PipelineState::Classified);
            Some(c)
        } else {
            None
        };

        // written (WGS84)
        let wgs84_path = name_for("wgs84");
        artifacts.register(&wgs84_path);
        raster::write_scalar_file(&wgs84_path, &scalar)?;
        state.advance(PipelineState::Written);

        // clipped
        let clipped = clip_scalar(&scalar, &boundaries)?;
        let clipped_path = name_for("clipped");
        artifacts.register(&clipped_path);
        raster::write_scalar_file(&clipped_path, &clipped)?;
        state.advance(PipelineState::Clipped);
        let statistics = SurfaceStatistics::from_raster(&clipped)?;

        // reprojected (target CRS)
        let projected = reproject_scalar(
            &clipped,
            self.config.target_crs,
            self.config.target_resolution,
        )?;
        let final_path = name_for("final");
        artifacts.register(&final_path);
        raster::write_scalar_file(&final_path, &projected)?;
        state.advance(PipelineState::Reprojected);

        // contoured (optional branch, reads the published artifact back)
        let contours = match &request.contours {
            Some(options) => {
                let decoded = raster::read_file(&final_path)?;
                let DecodedRaster::Scalar(for_contours) = decoded else {
                    return Err(PipelineError::Raster(raster::RasterError::Decode(
                        "expected a scalar raster for contouring".to_string(),
                    )));
                };
                let set = extract_contours(&for_contours, options.interval, options.smooth)?;
                state.advance(PipelineState::Contoured);
                Some(feature_collection(
                    &set,
                    &request.field,
                    request.method.name(),
                ))
            }
            None => None,
        };

        // publishing
        state.advance(PipelineState::Publishing);
        let layer = format!("{}_{}_surface", request.field, request.method.name());
        self.sink.publish_raster(&layer, &final_path)?;

        let (colored_layer, legend) = match classified {
            Some(classified) => {
                let clipped_rgb = clip_rgb(&classified.raster, &boundaries)?;
                let projected_rgb = reproject_rgb(
                    &clipped_rgb,
                    self.config.target_crs,
                    self.config.target_resolution,
                )?;
                let colored_path = name_for("colored");
                artifacts.register(&colored_path);
                raster::write_rgb_file(&colored_path, &projected_rgb)?;

                let colored_layer = format!("{layer}_colored");
                self.sink.publish_raster(&colored_layer, &colored_path)?;
                (Some(colored_layer), Some(classified.legend))
            }
            None => (None, None),
        };

        state.advance(PipelineState::Done);
        info!(layer, artifacts = artifacts.len(), "pipeline finished");

        Ok(PipelineOutcome {
            layer,
            colored_layer,
            samples_used: samples.len(),
            boundaries_used: boundaries.len(),
            statistics,
            legend,
            contours,
        })
    }
}

/// Envelope of the boundary polygons.
fn boundary_extent(boundaries: &[Polygon<f64>]) -> Result<BoundingBox> {
    let mut extent: Option<BoundingBox> = None;
    for polygon in boundaries {
        if let Some(rect) = polygon.bounding_rect() {
            let bbox = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
            extent = Some(match extent {
                Some(e) => e.union(&bbox),
                None => bbox,
            });
        }
    }
    extent.ok_or_else(|| {
        PipelineError::Common(GwError::DegenerateExtent(
            "boundary polygons have no extent".to_string(),
        ))
    })
}
