//! Top-level orchestration.
//!
//! The core components return plain result values; anything user-facing
//! (display, persistence) happens in whatever layer consumes the records
//! emitted here.

pub mod pipeline;

pub use pipeline::*;
