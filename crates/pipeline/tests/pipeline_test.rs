//! End-to-end pipeline tests with in-memory collaborators.

use geo::Polygon;
use gw_common::{BoundingBox, SamplePoint, SurfaceGrid};
use interpolation::{interpolate_idw, IdwParams};
use pipeline::{
    BoundarySource, GeoServerConfig, InterpolationRequest, Orchestrator, PipelineConfig,
    PipelineError, PublishSink, RawRequest, SampleSource,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use test_utils::{linear_trend, linear_trend_samples, square_boundary};

struct StaticSamples(Vec<SamplePoint>);

impl SampleSource for StaticSamples {
    fn samples_for_field(&self, _field: &str) -> pipeline::Result<Vec<SamplePoint>> {
        Ok(self.0.clone())
    }
}

struct StaticBoundaries(Vec<Polygon<f64>>);

impl BoundarySource for StaticBoundaries {
    fn boundaries(&self, _ids: &[String]) -> pipeline::Result<Vec<Polygon<f64>>> {
        Ok(self.0.clone())
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    published: Arc<Mutex<Vec<String>>>,
}

impl PublishSink for RecordingSink {
    fn publish_raster(&self, layer: &str, path: &Path) -> pipeline::Result<()> {
        assert!(path.exists(), "published file must exist at publish time");
        self.published.lock().unwrap().push(layer.to_string());
        Ok(())
    }
}

struct FailingSink;

impl PublishSink for FailingSink {
    fn publish_raster(&self, _layer: &str, _path: &Path) -> pipeline::Result<()> {
        Err(PipelineError::Publish("store rejected".to_string()))
    }
}

fn test_config(dir: &TempDir) -> PipelineConfig {
    PipelineConfig {
        geoserver: GeoServerConfig {
            base_url: "http://localhost:8080/geoserver".to_string(),
            username: "admin".to_string(),
            password: "unused".to_string(),
            workspace: "groundwater".to_string(),
        },
        working_dir: dir.path().to_path_buf(),
        grid_resolution: 0.01,
        target_crs: gw_common::CrsCode::UTM_44N,
        target_resolution: 200.0,
    }
}

fn request(json: &str) -> InterpolationRequest {
    serde_json::from_str::<RawRequest>(json)
        .unwrap()
        .validate()
        .unwrap()
}

fn dir_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

#[test]
fn idw_recovers_linear_trend_at_interior_cells() {
    let samples = linear_trend_samples(50, (77.0, 78.0), (14.0, 15.0), 99);
    let extent = BoundingBox::new(77.0, 14.0, 78.0, 15.0);
    let grid = SurfaceGrid::cover(&extent, &extent, 0.01).unwrap();
    let surface = interpolate_idw(&samples, &grid, &IdwParams::default()).unwrap();

    // Five interior probe cells, each within 15% of the true trend
    for (row, col) in [(30, 30), (50, 50), (40, 70), (70, 40), (60, 60)] {
        let x = grid.x_coord(col);
        let y = grid.y_coord(row);
        let expected = linear_trend(x, y);
        let got = surface[row * grid.width + col];
        let tolerance = 0.15 * expected.abs();
        assert!(
            (got - expected).abs() <= tolerance,
            "at ({x:.3},{y:.3}): got {got:.2}, expected {expected:.2}"
        );
    }
}

#[test]
fn full_run_publishes_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let sink = RecordingSink::default();
    let published = sink.published.clone();

    let orchestrator = Orchestrator::new(
        test_config(&dir),
        StaticSamples(linear_trend_samples(40, (77.1, 77.9), (14.1, 14.9), 3)),
        StaticBoundaries(vec![square_boundary(77.2, 14.2, 77.8, 14.8)]),
        sink,
    )
    .unwrap();

    let outcome = orchestrator
        .run(&request(
            r#"{"method": "idw", "field": "water_level", "boundary_ids": ["D-501"]}"#,
        ))
        .unwrap();

    assert_eq!(outcome.layer, "water_level_idw_surface");
    assert_eq!(published.lock().unwrap().as_slice(), ["water_level_idw_surface"]);
    assert!(outcome.colored_layer.is_none());
    assert!(outcome.contours.is_none());
    assert_eq!(outcome.samples_used, 40);
    assert_eq!(outcome.boundaries_used, 1);

    // Trend range over the clipped area
    assert!(outcome.statistics.min >= linear_trend(77.0, 14.0) - 1.0);
    assert!(outcome.statistics.max <= linear_trend(78.0, 15.0) + 1.0);
    assert!(outcome.statistics.std >= 0.0);
    assert!(outcome.statistics.valid_cells > 0);

    assert!(dir_is_empty(&dir), "artifacts must be removed after success");
}

#[test]
fn colored_and_contoured_run() {
    let dir = TempDir::new().unwrap();
    let sink = RecordingSink::default();
    let published = sink.published.clone();

    let orchestrator = Orchestrator::new(
        test_config(&dir),
        StaticSamples(linear_trend_samples(40, (77.1, 77.9), (14.1, 14.9), 11)),
        StaticBoundaries(vec![square_boundary(77.2, 14.2, 77.8, 14.8)]),
        sink,
    )
    .unwrap();

    let outcome = orchestrator
        .run(&request(
            r#"{
                "method": "idw",
                "field": "water_level",
                "boundary_ids": ["D-501"],
                "create_colored": true,
                "generate_contours": true
            }"#,
        ))
        .unwrap();

    assert_eq!(
        outcome.colored_layer.as_deref(),
        Some("water_level_idw_surface_colored")
    );
    assert_eq!(published.lock().unwrap().len(), 2);

    let legend = outcome.legend.unwrap();
    assert!(!legend.is_empty());
    assert!(legend.len() <= 5);

    let contours = outcome.contours.unwrap();
    assert!(!contours.features.is_empty());
    assert_eq!(
        contours.properties.statistics.total_contours,
        contours.features.len()
    );
    // Contours come from the reprojected raster, so coordinates are in
    // UTM meters
    let [x, y] = contours.features[0].geometry.coordinates[0];
    assert!(x > 100_000.0 && x < 900_000.0);
    assert!(y > 1_000_000.0);

    assert!(dir_is_empty(&dir));
}

#[test]
fn publish_failure_still_cleans_up() {
    let dir = TempDir::new().unwrap();

    let orchestrator = Orchestrator::new(
        test_config(&dir),
        StaticSamples(linear_trend_samples(30, (77.1, 77.9), (14.1, 14.9), 5)),
        StaticBoundaries(vec![square_boundary(77.2, 14.2, 77.8, 14.8)]),
        FailingSink,
    )
    .unwrap();

    let err = orchestrator
        .run(&request(
            r#"{"method": "idw", "field": "water_level", "boundary_ids": ["D-501"]}"#,
        ))
        .unwrap_err();

    assert!(matches!(err, PipelineError::Publish(_)));
    assert!(dir_is_empty(&dir), "artifacts must be removed after failure");
}

#[test]
fn empty_sample_set_rejected_before_any_work() {
    let dir = TempDir::new().unwrap();
    let sink = RecordingSink::default();
    let published = sink.published.clone();

    let orchestrator = Orchestrator::new(
        test_config(&dir),
        StaticSamples(Vec::new()),
        StaticBoundaries(vec![square_boundary(77.2, 14.2, 77.8, 14.8)]),
        sink,
    )
    .unwrap();

    let err = orchestrator
        .run(&request(
            r#"{"method": "idw", "field": "missing_field", "boundary_ids": ["D-501"]}"#,
        ))
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoSamples(_)));
    assert!(published.lock().unwrap().is_empty());
    assert!(dir_is_empty(&dir));
}

#[test]
fn boundary_outside_sample_area_still_completes() {
    let dir = TempDir::new().unwrap();

    // The grid covers the union of samples and boundary, so a boundary
    // far from every well still clips a valid (if extrapolated) window
    let orchestrator = Orchestrator::new(
        test_config(&dir),
        StaticSamples(linear_trend_samples(30, (77.1, 77.3), (14.1, 14.3), 8)),
        StaticBoundaries(vec![square_boundary(77.6, 14.6, 77.9, 14.9)]),
        RecordingSink::default(),
    )
    .unwrap();

    let outcome = orchestrator
        .run(&request(
            r#"{"method": "idw", "field": "water_level", "boundary_ids": ["D-999"]}"#,
        ))
        .unwrap();
    assert!(outcome.statistics.valid_cells > 0);
    assert!(dir_is_empty(&dir));
}

#[test]
fn spline_method_end_to_end() {
    let dir = TempDir::new().unwrap();
    let sink = RecordingSink::default();

    let orchestrator = Orchestrator::new(
        test_config(&dir),
        StaticSamples(linear_trend_samples(25, (77.1, 77.9), (14.1, 14.9), 21)),
        StaticBoundaries(vec![square_boundary(77.3, 14.3, 77.7, 14.7)]),
        sink,
    )
    .unwrap();

    let outcome = orchestrator
        .run(&request(
            r#"{"method": "spline", "field": "water_level", "boundary_ids": ["D-501"]}"#,
        ))
        .unwrap();

    assert_eq!(outcome.layer, "water_level_spline_surface");
    // The boundary sits inside the sample hull, so the clipped surface
    // has real values
    assert!(outcome.statistics.valid_cells > 0);
    assert!(dir_is_empty(&dir));
}
