//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and training
//! - exported as structural snapshots for downstream persistence
//! - reloaded later for comparisons

use serde::{Deserialize, Serialize};

use crate::error::GrowthError;
use crate::models::GrowthCurve;

/// An ordered set of (age, height) observations.
///
/// Row alignment between the two columns is preserved; no ordering of the
/// ages themselves is assumed by any fitting routine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationSet {
    ages: Vec<f64>,
    heights: Vec<f64>,
}

impl ObservationSet {
    /// Build a validated observation set.
    ///
    /// Rejects unequal column lengths, empty data and non-finite values
    /// eagerly, so downstream numeric code never sees them.
    pub fn new(ages: Vec<f64>, heights: Vec<f64>) -> Result<Self, GrowthError> {
        if ages.len() != heights.len() {
            return Err(GrowthError::ShapeMismatch(format!(
                "ages has {} rows but heights has {}",
                ages.len(),
                heights.len()
            )));
        }
        if ages.is_empty() {
            return Err(GrowthError::ShapeMismatch(
                "observation set must contain at least one row".to_string(),
            ));
        }
        if ages.iter().any(|v| !v.is_finite()) {
            return Err(GrowthError::ShapeMismatch(
                "ages contain non-finite values".to_string(),
            ));
        }
        if heights.iter().any(|v| !v.is_finite()) {
            return Err(GrowthError::ShapeMismatch(
                "heights contain non-finite values".to_string(),
            ));
        }
        Ok(Self { ages, heights })
    }

    pub fn len(&self) -> usize {
        self.ages.len()
    }

    /// Always false for a constructed set (`new` requires at least one row),
    /// kept for API completeness.
    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }

    pub fn ages(&self) -> &[f64] {
        &self.ages
    }

    pub fn heights(&self) -> &[f64] {
        &self.heights
    }

    /// Sample mean of the observed heights.
    pub fn mean_height(&self) -> f64 {
        self.heights.iter().sum::<f64>() / self.heights.len() as f64
    }

    /// Width of the observed age range (zero for a single observation).
    pub fn age_span(&self) -> f64 {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for &a in &self.ages {
            min = min.min(a);
            max = max.max(a);
        }
        max - min
    }
}

/// Output of a single parametric fit. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    pub model: GrowthCurve,
    /// Optimized parameter vector.
    pub theta: Vec<f64>,
    /// True only if the optimizer's own convergence test passed. Exhausting
    /// the iteration budget does not count.
    pub success: bool,
    /// Final mean-squared-error loss at `theta`.
    pub loss: f64,
    /// Number of optimizer iterations performed.
    pub iterations: usize,
}

/// Iteration budget and step size for gradient-based training.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrainSettings {
    pub epochs: usize,
    pub learning_rate: f64,
}

/// Configuration for a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Candidate growth curves, fitted and corrected in order.
    pub models: Vec<GrowthCurve>,
    /// Initial observation-noise variance for both the discrepancy
    /// corrections and the GP baseline.
    pub noise_init_value: f64,
    /// Training budget for each discrepancy correction.
    pub train: TrainSettings,
    /// Training budget for the GP baseline (typically larger).
    pub gp_train: TrainSettings,
    /// Emit periodic progress lines via `log` during training.
    pub progress: bool,
}

/// Learned kernel hyperparameters in natural (non-log) units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KernelSnapshot {
    pub length_scale: f64,
    pub signal_variance: f64,
    pub noise_variance: f64,
}

/// Structural snapshot of a trained discrepancy model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscrepancySnapshot {
    pub model_name: String,
    pub theta: Vec<f64>,
    pub kernel: KernelSnapshot,
    /// Marginal log-likelihood of the residual GP after the last epoch,
    /// if at least one epoch ran.
    pub log_likelihood: Option<f64>,
}

/// Structural snapshot of a trained GP regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpSnapshot {
    pub prior_mean: f64,
    pub kernel: KernelSnapshot,
    pub log_likelihood: Option<f64>,
}

/// Inspectable replacement for the opaque serialized-model blob: every
/// learned parameter is visible in the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelSnapshot {
    Discrepancy(DiscrepancySnapshot),
    Gp(GpSnapshot),
}

/// Result record emitted per fitted model for downstream persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    pub model_name: String,
    /// Fitted parametric parameters; `None` for the GP baseline.
    pub theta: Option<Vec<f64>>,
    pub noise_init_value: f64,
    pub epochs: usize,
    pub learning_rate: f64,
    pub snapshot: ModelSnapshot,
}
