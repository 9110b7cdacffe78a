//! Gaussian-process machinery.
//!
//! Responsibilities:
//!
//! - shared zero-mean GP training core: marginal log-likelihood ascent over
//!   kernel hyperparameters and noise variance (`core`)
//! - the standalone non-parametric baseline regression (`regression`)
//!
//! The discrepancy model reuses `core` with parametric residuals as targets.

pub mod core;
pub mod regression;

pub use self::core::*;
pub use self::regression::*;
