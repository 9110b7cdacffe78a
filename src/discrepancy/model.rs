//! Residual correction model for a frozen parametric fit.
//!
//! Construction freezes the parametric prediction: `theta` is never updated
//! here. Training fits the correction GP's hyperparameters to the residual
//! `observed - parametric` by marginal-likelihood ascent; prediction returns
//! `forward(age, theta) + correction(age)`.

use crate::domain::{DiscrepancySnapshot, ObservationSet};
use crate::error::GrowthError;
use crate::gp::core::{GpCore, GpPosterior};
use crate::gp::regression::validate_learning_rate;
use crate::models::GrowthCurve;

#[derive(Debug, Clone)]
pub struct DiscrepancyModel {
    data: ObservationSet,
    model: GrowthCurve,
    theta: Vec<f64>,
    /// Parametric predictions at the training ages, fixed at construction.
    parametric: Vec<f64>,
    core: GpCore,
    posterior: Option<GpPosterior>,
}

impl DiscrepancyModel {
    /// Wrap a fitted model and learn nothing yet.
    ///
    /// Rejects a `theta` of the wrong arity (`ShapeMismatch`) and non-finite
    /// parametric predictions (`InvalidPrediction`) before any training can
    /// start.
    pub fn new(
        data: ObservationSet,
        model: GrowthCurve,
        theta: Vec<f64>,
        noise_init_value: f64,
    ) -> Result<Self, GrowthError> {
        let parametric = model.forward(data.ages(), &theta)?;
        if parametric.iter().any(|p| !p.is_finite()) {
            return Err(GrowthError::InvalidPrediction {
                model: model.display_name().to_string(),
                context: "discrepancy construction".to_string(),
            });
        }

        let residuals: Vec<f64> = data
            .heights()
            .iter()
            .zip(&parametric)
            .map(|(h, p)| h - p)
            .collect();
        let core = GpCore::new(data.ages(), &residuals, noise_init_value)?;

        Ok(Self {
            data,
            model,
            theta,
            parametric,
            core,
            posterior: None,
        })
    }

    /// Run exactly `epochs` ascent steps on the residual GP's marginal
    /// log-likelihood, then freeze the correction. No early stopping:
    /// `epochs` is a compute budget, not a success criterion.
    ///
    /// With `progress` set, emits roughly ten `log::info!` lines over the
    /// whole run.
    pub fn train(
        &mut self,
        epochs: usize,
        learning_rate: f64,
        progress: bool,
    ) -> Result<(), GrowthError> {
        validate_learning_rate(learning_rate)?;
        let log_every = (epochs / 10).max(1);
        for epoch in 0..epochs {
            let mll = self.core.ascend_once(learning_rate)?;
            if progress && (epoch + 1) % log_every == 0 {
                log::info!(
                    "{} discrepancy epoch {}/{}: mll={:.6}",
                    self.model.display_name(),
                    epoch + 1,
                    epochs,
                    mll
                );
            }
        }
        if epochs > 0 {
            self.posterior = Some(self.core.posterior()?);
        }
        Ok(())
    }

    /// Corrected prediction: parametric forward pass plus the learned
    /// residual correction. Before training the correction is zero.
    pub fn predict(&self, age: f64) -> Result<f64, GrowthError> {
        let base = self.model.predict(age, &self.theta);
        if !base.is_finite() {
            return Err(GrowthError::InvalidPrediction {
                model: self.model.display_name().to_string(),
                context: "prediction".to_string(),
            });
        }
        let correction = self.posterior.as_ref().map_or(0.0, |p| p.mean_at(age));
        Ok(base + correction)
    }

    pub fn model(&self) -> GrowthCurve {
        self.model
    }

    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    /// Mean squared error of the pure parametric model on the training data.
    pub fn parametric_mse(&self) -> f64 {
        mse(self.data.heights(), &self.parametric)
    }

    /// Mean squared error of the corrected predictions on the training data.
    pub fn corrected_mse(&self) -> Result<f64, GrowthError> {
        let corrected: Vec<f64> = self
            .data
            .ages()
            .iter()
            .map(|&age| self.predict(age))
            .collect::<Result<_, _>>()?;
        Ok(mse(self.data.heights(), &corrected))
    }

    /// Structural snapshot of every learned parameter.
    pub fn snapshot(&self) -> DiscrepancySnapshot {
        DiscrepancySnapshot {
            model_name: self.model.display_name().to_string(),
            theta: self.theta.clone(),
            kernel: self.core.kernel_snapshot(),
            log_likelihood: self.core.last_log_likelihood(),
        }
    }
}

fn mse(observed: &[f64], predicted: &[f64]) -> f64 {
    let n = observed.len() as f64;
    observed
        .iter()
        .zip(predicted)
        .map(|(o, p)| {
            let r = o - p;
            r * r
        })
        .sum::<f64>()
        / n
}
