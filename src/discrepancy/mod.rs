//! Discrepancy correction on top of a fitted parametric model.
//!
//! The parametric families are deliberately rigid; their systematic misfit
//! shows up as structure in the residuals. This module learns that structure
//! as a zero-mean GP over the residual and adds it back at prediction time.

pub mod model;

pub use model::*;
