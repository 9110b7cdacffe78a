//! Synthetic (age, height) sample generation.
//!
//! Heights follow a logistic growth curve with additive Gaussian measurement
//! noise. Generation is seeded and fully deterministic, so tests and demos
//! are reproducible.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::ObservationSet;
use crate::error::GrowthError;
use crate::models::GrowthCurve;

/// Ground-truth logistic parameters used by the generator.
const TRUE_THETA: [f64; 3] = [168.0, 0.3, 2.5];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    /// Number of observations to draw.
    pub count: usize,
    /// Age range to sample uniformly from.
    pub age_min: f64,
    pub age_max: f64,
    /// Standard deviation of the additive measurement noise.
    pub noise_sd: f64,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            count: 60,
            age_min: 0.0,
            age_max: 18.0,
            noise_sd: 2.0,
            seed: 7,
        }
    }
}

/// Generate a synthetic observation set.
pub fn generate_sample(config: &SampleConfig) -> Result<ObservationSet, GrowthError> {
    if config.count == 0 {
        return Err(GrowthError::ShapeMismatch(
            "sample count must be > 0".to_string(),
        ));
    }
    if !(config.age_min.is_finite()
        && config.age_max.is_finite()
        && config.age_max > config.age_min)
    {
        return Err(GrowthError::ShapeMismatch(format!(
            "invalid age range [{}, {}]",
            config.age_min, config.age_max
        )));
    }
    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(GrowthError::ShapeMismatch(format!(
            "invalid noise_sd {}",
            config.noise_sd
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0).map_err(|e| {
        GrowthError::ShapeMismatch(format!("noise distribution error: {e}"))
    })?;

    let mut ages = Vec::with_capacity(config.count);
    let mut heights = Vec::with_capacity(config.count);
    for _ in 0..config.count {
        let age = rng.gen_range(config.age_min..=config.age_max);
        let z: f64 = normal.sample(&mut rng);
        let height = GrowthCurve::Logf.predict(age, &TRUE_THETA) + config.noise_sd * z;
        ages.push(age);
        heights.push(height);
    }

    ObservationSet::new(ages, heights)
}
