//! Non-parametric GP regression baseline.
//!
//! Fits a Gaussian process directly to the observation set, independent of
//! any parametric growth curve. The prior mean is the sample mean of the
//! observed heights; the core trains on centered heights.

use crate::domain::{GpSnapshot, ObservationSet};
use crate::error::GrowthError;
use crate::gp::core::{GpCore, GpPosterior, Prediction};

#[derive(Debug, Clone)]
pub struct GpRegression {
    data: ObservationSet,
    prior_mean: f64,
    core: GpCore,
    posterior: Option<GpPosterior>,
}

impl GpRegression {
    pub fn new(data: ObservationSet, noise_init_value: f64) -> Result<Self, GrowthError> {
        let prior_mean = data.mean_height();
        let centered: Vec<f64> = data.heights().iter().map(|h| h - prior_mean).collect();
        let core = GpCore::new(data.ages(), &centered, noise_init_value)?;
        Ok(Self {
            data,
            prior_mean,
            core,
            posterior: None,
        })
    }

    /// Run exactly `epochs` ascent steps on the marginal log-likelihood,
    /// then freeze the posterior.
    ///
    /// `epochs == 0` is a no-op: no covariance is ever built and predictions
    /// stay at the prior.
    pub fn train(&mut self, epochs: usize, learning_rate: f64) -> Result<(), GrowthError> {
        validate_learning_rate(learning_rate)?;
        for epoch in 0..epochs {
            let mll = self.core.ascend_once(learning_rate)?;
            log::debug!("gp epoch {}/{}: mll={:.6}", epoch + 1, epochs, mll);
        }
        if epochs > 0 {
            self.posterior = Some(self.core.posterior()?);
        }
        Ok(())
    }

    /// Posterior mean and latent variance at an arbitrary age. Before any
    /// training the prior itself is returned.
    pub fn predict(&self, age: f64) -> Prediction {
        match &self.posterior {
            Some(posterior) => Prediction {
                mean: self.prior_mean + posterior.mean_at(age),
                variance: posterior.variance_at(age),
            },
            None => Prediction {
                mean: self.prior_mean,
                variance: self.core.prior_variance(),
            },
        }
    }

    pub fn data(&self) -> &ObservationSet {
        &self.data
    }

    /// Structural snapshot of every learned parameter.
    pub fn snapshot(&self) -> GpSnapshot {
        GpSnapshot {
            prior_mean: self.prior_mean,
            kernel: self.core.kernel_snapshot(),
            log_likelihood: self.core.last_log_likelihood(),
        }
    }
}

pub(crate) fn validate_learning_rate(learning_rate: f64) -> Result<(), GrowthError> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(GrowthError::ShapeMismatch(format!(
            "learning_rate must be finite and positive, got {learning_rate}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_point_data() -> ObservationSet {
        ObservationSet::new(
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![10.0, 20.0, 29.0, 41.0, 49.0],
        )
        .unwrap()
    }

    #[test]
    fn zero_epochs_leaves_predictions_at_the_prior_mean() {
        let data = five_point_data();
        let prior_mean = data.mean_height();

        let mut gp = GpRegression::new(data, 50.0).unwrap();
        gp.train(0, 0.1).unwrap();

        for &age in &[1.0, 3.0, 17.0] {
            let p = gp.predict(age);
            assert_eq!(p.mean, prior_mean, "no update may occur for epochs=0");
        }
    }

    #[test]
    fn uncertainty_grows_away_from_the_data() {
        let mut gp = GpRegression::new(five_point_data(), 1.0).unwrap();
        gp.train(50, 0.01).unwrap();

        let at_data = gp.predict(3.0).variance;
        let far_out = gp.predict(80.0).variance;
        assert!(
            at_data < far_out,
            "variance at data ({at_data}) should be below far-field ({far_out})"
        );
    }

    #[test]
    fn trained_predictions_are_idempotent() {
        let mut gp = GpRegression::new(five_point_data(), 2.0).unwrap();
        gp.train(10, 0.01).unwrap();

        let a = gp.predict(2.5);
        let b = gp.predict(2.5);
        assert_eq!(a.mean, b.mean);
        assert_eq!(a.variance, b.variance);
    }

    #[test]
    fn rejects_invalid_learning_rate() {
        let mut gp = GpRegression::new(five_point_data(), 1.0).unwrap();
        assert!(gp.train(5, 0.0).is_err());
        assert!(gp.train(5, f64::NAN).is_err());
    }

    #[test]
    fn snapshot_reflects_training() {
        let mut gp = GpRegression::new(five_point_data(), 50.0).unwrap();
        assert!(gp.snapshot().log_likelihood.is_none());

        gp.train(5, 0.01).unwrap();
        let snap = gp.snapshot();
        assert!(snap.log_likelihood.unwrap().is_finite());
        assert!((snap.prior_mean - 29.8).abs() < 1e-12);
    }
}
