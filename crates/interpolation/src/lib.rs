//! Spatial interpolation of scattered well measurements onto regular
//! grids.
//!
//! Three estimators are provided: inverse distance weighting, radial
//! basis functions, and a triangulated spline. All of them take WGS84
//! sample points plus a [`gw_common::SurfaceGrid`] and return a
//! row-major surface with row 0 at the northern edge.

pub mod delaunay;
pub mod error;
pub mod idw;
pub mod rbf;
pub mod spline;

pub use error::InterpolationError;
pub use idw::{interpolate_idw, IdwParams};
pub use rbf::{interpolate_rbf, RbfKernel, RbfParams};
pub use spline::interpolate_spline;

use gw_common::{SamplePoint, SurfaceGrid};
use std::fmt;

/// Interpolation method plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    Idw(IdwParams),
    Rbf,
    Spline,
}

impl Method {
    /// Parse a request method name. Unknown names are rejected rather
    /// than defaulted so a typo cannot silently change the output.
    pub fn parse(name: &str, power: Option<f64>, radius: Option<f64>) -> Result<Self, InterpolationError> {
        match name.to_lowercase().as_str() {
            "idw" => Ok(Method::Idw(IdwParams {
                power: power.unwrap_or(idw::DEFAULT_POWER),
                radius,
            })),
            // "kriging" is the legacy request name for the RBF surface
            "rbf" | "kriging" => Ok(Method::Rbf),
            "spline" => Ok(Method::Spline),
            other => Err(InterpolationError::InvalidParameter(format!(
                "unknown interpolation method '{other}'"
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Method::Idw(_) => "idw",
            Method::Rbf => "rbf",
            Method::Spline => "spline",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run the chosen estimator over the grid.
pub fn interpolate_surface(
    method: &Method,
    samples: &[SamplePoint],
    grid: &SurfaceGrid,
) -> Result<Vec<f64>, InterpolationError> {
    match method {
        Method::Idw(params) => interpolate_idw(samples, grid, params),
        Method::Rbf => interpolate_rbf(samples, grid, &RbfParams::default()),
        Method::Spline => interpolate_spline(samples, grid),
    }
}
