//! Observation-data suppliers.
//!
//! The core treats data acquisition as an external collaborator; this module
//! provides a deterministic synthetic supplier for demos and tests.

pub mod sample;

pub use sample::*;
