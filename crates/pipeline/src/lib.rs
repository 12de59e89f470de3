//! Request orchestration for the groundwater surface pipeline.
//!
//! Wires the sample and boundary sources through grid construction,
//! interpolation, classification, raster I/O, clipping, reprojection
//! and contour extraction, then publishes the finished rasters to the
//! layer-hosting sink. Each request is synchronous and self-contained;
//! callers wanting parallelism run requests on their own worker
//! threads.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod geoserver;
pub mod orchestrator;
pub mod request;
pub mod sources;

pub use artifacts::ArtifactRegistry;
pub use config::{GeoServerConfig, PipelineConfig};
pub use error::{PipelineError, Result};
pub use geoserver::GeoServerSink;
pub use orchestrator::{Orchestrator, PipelineOutcome, SurfaceStatistics};
pub use request::{ContourOptions, InterpolationRequest, RawRequest};
pub use sources::{BoundarySource, PublishSink, SampleSource};
