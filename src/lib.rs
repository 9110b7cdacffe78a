//! `growth-curves` library crate.
//!
//! Fits parametric growth-curve models to (age, height) observations, learns
//! a GP discrepancy correction on top of each fitted curve, and fits a
//! standalone GP regression as a non-parametric baseline.
//!
//! Layering, leaf-first:
//!
//! - `models`: the pluggable growth-curve family (forward pass + initial guess)
//! - `math`: RBF kernel and jitter-stabilized Cholesky factorization
//! - `fit`: quasi-Newton least-squares parameter estimation
//! - `gp`: shared GP training core and the baseline regression
//! - `discrepancy`: residual correction over a frozen parametric fit
//! - `app`: the sequential orchestration pipeline

pub mod app;
pub mod data;
pub mod discrepancy;
pub mod domain;
pub mod error;
pub mod fit;
pub mod gp;
pub mod math;
pub mod models;
