//! Interpolation error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InterpolationError {
    #[error("{method} requires at least {needed} samples, got {got}")]
    InsufficientSamples {
        method: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("all RBF kernels failed: {}", format_attempts(.attempts))]
    AllKernelsFailed { attempts: Vec<(String, String)> },

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

fn format_attempts(attempts: &[(String, String)]) -> String {
    attempts
        .iter()
        .map(|(kernel, reason)| format!("{kernel}: {reason}"))
        .collect::<Vec<_>>()
        .join("; ")
}
