//! Parametric curve fitting.
//!
//! Responsibilities:
//!
//! - define the mean-squared-error objective over the parameter vector
//! - minimize it with a quasi-Newton solver from the model's initial guess
//! - report convergence honestly (iteration exhaustion is not success)

pub mod fitter;

pub use fitter::*;
