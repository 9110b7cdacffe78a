//! Error types for the fitting and training pipeline.
//!
//! Every failure mode is reported to the immediate caller; nothing is
//! retried automatically except the bounded jitter retry inside the
//! Cholesky factorization (see `math::linalg`).

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GrowthError {
    /// The parametric fitter did not converge. The parameter vector attached
    /// to a non-converged fit is not trustworthy and must not be consumed by
    /// discrepancy training.
    #[error("optimization for model {model} failed: {reason}")]
    OptimizationFailure { model: String, reason: String },

    /// A growth model produced NaN/Inf output for a candidate parameter
    /// vector. Treated as a fit failure, never clamped or skipped.
    #[error("model {model} produced a non-finite prediction during {context}")]
    InvalidPrediction { model: String, context: String },

    /// The GP covariance matrix stayed non-positive-definite after all
    /// jitter retries. Fatal for that training step.
    #[error("covariance matrix is not positive definite after {retries} jitter retries")]
    NumericalInstability { retries: usize },

    /// Age/height arrays of unequal length, or a parameter vector of the
    /// wrong arity for a model. Rejected eagerly at call boundaries.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
}
