//! Radial basis function interpolation.
//!
//! Fits one weight per sample by solving the dense kernel system, then
//! evaluates the weighted kernel sum at every grid point. Kernels are
//! tried in a fixed order until one produces a usable fit.

use crate::error::InterpolationError;
use gw_common::{SamplePoint, SurfaceGrid};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, warn};

/// Regularization added to the kernel matrix diagonal.
const SMOOTHING: f64 = 0.1;

/// Kernel functions, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RbfKernel {
    Multiquadric,
    Gaussian,
    Linear,
}

impl RbfKernel {
    /// Fallback chain tried when no kernel is pinned.
    pub const FALLBACK_ORDER: [RbfKernel; 3] =
        [RbfKernel::Multiquadric, RbfKernel::Gaussian, RbfKernel::Linear];

    pub fn name(&self) -> &'static str {
        match self {
            RbfKernel::Multiquadric => "multiquadric",
            RbfKernel::Gaussian => "gaussian",
            RbfKernel::Linear => "linear",
        }
    }

    fn eval(&self, r: f64, epsilon: f64) -> f64 {
        match self {
            RbfKernel::Multiquadric => ((r / epsilon).powi(2) + 1.0).sqrt(),
            RbfKernel::Gaussian => (-(r / epsilon).powi(2)).exp(),
            RbfKernel::Linear => r,
        }
    }
}

/// RBF parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbfParams {
    /// Pin a single kernel instead of walking the fallback chain.
    pub kernel: Option<RbfKernel>,
    /// Shape parameter; derived from the value spread when unset.
    pub epsilon: Option<f64>,
}

/// Interpolate scattered samples onto the grid with radial basis
/// functions. Returns values in row-major order, row 0 at the northern
/// edge.
pub fn interpolate_rbf(
    samples: &[SamplePoint],
    grid: &SurfaceGrid,
    params: &RbfParams,
) -> Result<Vec<f64>, InterpolationError> {
    if samples.is_empty() {
        return Err(InterpolationError::InsufficientSamples {
            method: "RBF",
            needed: 1,
            got: 0,
        });
    }

    let epsilon = match params.epsilon {
        Some(e) if e > 0.0 && e.is_finite() => e,
        Some(e) => {
            return Err(InterpolationError::InvalidParameter(format!(
                "RBF epsilon must be positive, got {e}"
            )))
        }
        None => default_epsilon(samples),
    };

    let kernels: &[RbfKernel] = match &params.kernel {
        Some(k) => std::slice::from_ref(k),
        None => &RbfKernel::FALLBACK_ORDER,
    };

    let mut attempts = Vec::new();
    for kernel in kernels {
        match fit_weights(samples, *kernel, epsilon) {
            Ok(weights) => {
                debug!(kernel = kernel.name(), epsilon, "RBF fit succeeded");
                return Ok(evaluate(samples, &weights, *kernel, epsilon, grid));
            }
            Err(reason) => {
                warn!(kernel = kernel.name(), %reason, "RBF kernel failed, trying next");
                attempts.push((kernel.name().to_string(), reason));
            }
        }
    }

    Err(InterpolationError::AllKernelsFailed { attempts })
}

/// Shape parameter from the value spread: one tenth of the standard
/// deviation, or 1.0 when all values are equal.
fn default_epsilon(samples: &[SamplePoint]) -> f64 {
    let n = samples.len() as f64;
    let mean = samples.iter().map(|s| s.value).sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|s| (s.value - mean).powi(2))
        .sum::<f64>()
        / n;
    let std = variance.sqrt();

    if std > 0.0 {
        std / 10.0
    } else {
        1.0
    }
}

fn fit_weights(
    samples: &[SamplePoint],
    kernel: RbfKernel,
    epsilon: f64,
) -> Result<DVector<f64>, String> {
    let n = samples.len();
    let mut a = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            let dx = samples[i].x - samples[j].x;
            let dy = samples[i].y - samples[j].y;
            let r = (dx * dx + dy * dy).sqrt();
            a[(i, j)] = kernel.eval(r, epsilon);
        }
        a[(i, i)] += SMOOTHING;
    }

    let rhs = DVector::from_iterator(n, samples.iter().map(|s| s.value));
    let weights = a
        .lu()
        .solve(&rhs)
        .ok_or_else(|| "kernel matrix is singular".to_string())?;

    if weights.iter().any(|w| !w.is_finite()) {
        return Err("solution contains non-finite weights".to_string());
    }

    Ok(weights)
}

fn evaluate(
    samples: &[SamplePoint],
    weights: &DVector<f64>,
    kernel: RbfKernel,
    epsilon: f64,
    grid: &SurfaceGrid,
) -> Vec<f64> {
    let width = grid.width;
    let xs = grid.x_coords();
    let mut values = vec![0.0f64; grid.len()];

    values
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out_row)| {
            let y = grid.y_coord(row);
            for (col, out) in out_row.iter_mut().enumerate() {
                let x = xs[col];
                let mut acc = 0.0;
                for (s, w) in samples.iter().zip(weights.iter()) {
                    let dx = s.x - x;
                    let dy = s.y - y;
                    acc += w * kernel.eval((dx * dx + dy * dy).sqrt(), epsilon);
                }
                *out = acc;
            }
        });

    values
}
