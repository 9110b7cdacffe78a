//! Model evaluation for the growth-curve family.
//!
//! The fitter relies on two primitive operations:
//! - predict height at a single age given a parameter vector
//! - evaluate a full observation-age vector (`forward`) for residuals
//!
//! Each variant also carries a fixed initial guess (`x0`) that the
//! quasi-Newton fitter starts from. The fitter and the discrepancy model
//! never branch on a specific variant's identity; only this module does.

use serde::{Deserialize, Serialize};

use crate::error::GrowthError;

/// Guard against `age = 0` in power-law terms.
const AGE_EPS: f64 = 1e-9;

/// JPPS-style curves measure age from conception, not birth.
const GESTATION_OFFSET: f64 = 0.75;

/// A named growth-curve variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthCurve {
    /// Straight-line baseline: `h = a*age + b`.
    Linear,
    /// von Bertalanffy saturating curve: `h = a * (1 - exp(-k (age - t0)))`.
    Linf,
    /// Logistic curve: `h = a / (1 + exp(-k (age - m)))`.
    Logf,
    /// JPPS-style multi-phase curve with three power-law components.
    Jpps,
}

impl GrowthCurve {
    /// Human-readable label for logs and result records.
    pub fn display_name(self) -> &'static str {
        match self {
            GrowthCurve::Linear => "linear",
            GrowthCurve::Linf => "linf",
            GrowthCurve::Logf => "logf",
            GrowthCurve::Jpps => "jpps",
        }
    }

    /// Fixed parameter-vector length for this variant.
    pub fn param_len(self) -> usize {
        match self {
            GrowthCurve::Linear => 2,
            GrowthCurve::Linf => 3,
            GrowthCurve::Logf => 3,
            GrowthCurve::Jpps => 7,
        }
    }

    /// Initial parameter guess (`x0`) for the fitter.
    ///
    /// The guesses are calibrated for human stature in centimeters over ages
    /// 0-20y, which is what the synthetic data generator produces.
    pub fn initial_guess(self) -> Vec<f64> {
        match self {
            GrowthCurve::Linear => vec![1.0, 0.0],
            GrowthCurve::Linf => vec![180.0, 0.1, -3.0],
            GrowthCurve::Logf => vec![180.0, 0.3, 3.0],
            GrowthCurve::Jpps => vec![165.0, 1.5, 0.6, 8.0, 2.5, 13.0, 12.0],
        }
    }

    /// Predict height at a single age.
    ///
    /// # Panics
    /// Panics if `theta` does not have length `param_len()`. Callers go
    /// through [`GrowthCurve::forward`], which checks arity first.
    pub fn predict(self, age: f64, theta: &[f64]) -> f64 {
        match self {
            GrowthCurve::Linear => theta[0] * age + theta[1],
            GrowthCurve::Linf => {
                let (a, k, t0) = (theta[0], theta[1], theta[2]);
                a * (1.0 - (-k * (age - t0)).exp())
            }
            GrowthCurve::Logf => {
                let (a, k, m) = (theta[0], theta[1], theta[2]);
                a / (1.0 + (-k * (age - m)).exp())
            }
            GrowthCurve::Jpps => {
                let a = theta[0];
                let t = (age + GESTATION_OFFSET).max(AGE_EPS);
                let mut denom = 1.0;
                for pair in theta[1..].chunks_exact(2) {
                    let (b, c) = (pair[0], pair[1]);
                    denom += (t / b).powf(c);
                }
                a * (1.0 - 1.0 / denom)
            }
        }
    }

    /// Predict heights for a vector of ages.
    ///
    /// The parameter vector is opaque to callers; only its arity is checked
    /// here. Non-finite outputs are *not* rejected at this level; the
    /// fitter decides how to surface them (see `fit::fitter`).
    pub fn forward(self, ages: &[f64], theta: &[f64]) -> Result<Vec<f64>, GrowthError> {
        if theta.len() != self.param_len() {
            return Err(GrowthError::ShapeMismatch(format!(
                "model {} expects {} parameters, got {}",
                self.display_name(),
                self.param_len(),
                theta.len()
            )));
        }
        Ok(ages.iter().map(|&age| self.predict(age, theta)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_rejects_wrong_arity() {
        let err = GrowthCurve::Linf.forward(&[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, GrowthError::ShapeMismatch(_)));
    }

    #[test]
    fn linear_predicts_exactly() {
        let h = GrowthCurve::Linear.forward(&[0.0, 1.0, 2.0], &[9.9, 0.1]).unwrap();
        assert!((h[0] - 0.1).abs() < 1e-12);
        assert!((h[1] - 10.0).abs() < 1e-12);
        assert!((h[2] - 19.9).abs() < 1e-12);
    }

    #[test]
    fn saturating_curves_are_finite_and_bounded() {
        for model in [GrowthCurve::Linf, GrowthCurve::Logf, GrowthCurve::Jpps] {
            let theta = model.initial_guess();
            for &age in &[0.0, 0.5, 1.0, 5.0, 10.0, 18.0] {
                let h = model.predict(age, &theta);
                assert!(h.is_finite(), "{} at age {age} -> {h}", model.display_name());
                assert!(h > 0.0 && h < 250.0, "{} at age {age} -> {h}", model.display_name());
            }
        }
    }

    #[test]
    fn growth_curves_increase_with_age_at_initial_guess() {
        for model in [GrowthCurve::Linf, GrowthCurve::Logf, GrowthCurve::Jpps] {
            let theta = model.initial_guess();
            let mut prev = model.predict(0.0, &theta);
            for i in 1..=36 {
                let age = i as f64 * 0.5;
                let h = model.predict(age, &theta);
                assert!(h >= prev, "{} not monotone at age {age}", model.display_name());
                prev = h;
            }
        }
    }

    #[test]
    fn forward_is_deterministic() {
        let ages = [0.3, 4.2, 9.7, 16.0];
        let theta = GrowthCurve::Logf.initial_guess();
        let a = GrowthCurve::Logf.forward(&ages, &theta).unwrap();
        let b = GrowthCurve::Logf.forward(&ages, &theta).unwrap();
        assert_eq!(a, b);
    }
}
