//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - validated observation data (`ObservationSet`)
//! - fit outputs (`FitResult`)
//! - training configuration (`TrainSettings`, `PipelineConfig`)
//! - serializable result records (`ModelRecord`, snapshot types)

pub mod types;

pub use types::*;
