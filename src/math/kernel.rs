//! Squared-exponential (RBF) kernel over scalar ages.
//!
//! Hyperparameters are stored in log space so that gradient ascent on the
//! marginal log-likelihood is unconstrained: any real-valued step keeps the
//! length scale and signal variance strictly positive.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// RBF kernel `k(a, b) = sigma_f^2 * exp(-(a - b)^2 / (2 l^2))`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RbfKernel {
    pub log_length_scale: f64,
    pub log_signal_variance: f64,
}

impl RbfKernel {
    pub fn new(length_scale: f64, signal_variance: f64) -> Self {
        Self {
            log_length_scale: length_scale.ln(),
            log_signal_variance: signal_variance.ln(),
        }
    }

    pub fn length_scale(&self) -> f64 {
        self.log_length_scale.exp()
    }

    pub fn signal_variance(&self) -> f64 {
        self.log_signal_variance.exp()
    }

    /// Kernel value at a pair of inputs.
    pub fn value(&self, a: f64, b: f64) -> f64 {
        let l = self.length_scale();
        let d = a - b;
        self.signal_variance() * (-(d * d) / (2.0 * l * l)).exp()
    }

    /// Noise-free covariance matrix from a precomputed squared-distance
    /// matrix (see [`squared_distances`]).
    pub fn covariance_from(&self, sq_dists: &DMatrix<f64>) -> DMatrix<f64> {
        let l2 = {
            let l = self.length_scale();
            l * l
        };
        let sf2 = self.signal_variance();
        sq_dists.map(|d2| sf2 * (-d2 / (2.0 * l2)).exp())
    }

    /// Cross-covariance vector between training inputs and one query input.
    pub fn cross_vector(&self, xs: &[f64], x: f64) -> DVector<f64> {
        DVector::from_iterator(xs.len(), xs.iter().map(|&xi| self.value(xi, x)))
    }

    /// Elementwise derivative of the covariance with respect to the log
    /// length scale: `dK/d(ln l) = K_f .* (d^2 / l^2)`.
    pub fn grad_log_length_scale(
        &self,
        sq_dists: &DMatrix<f64>,
        cov: &DMatrix<f64>,
    ) -> DMatrix<f64> {
        let l2 = {
            let l = self.length_scale();
            l * l
        };
        cov.zip_map(sq_dists, |k, d2| k * d2 / l2)
    }
}

/// Pairwise squared distances between scalar inputs.
pub fn squared_distances(xs: &[f64]) -> DMatrix<f64> {
    let n = xs.len();
    DMatrix::from_fn(n, n, |i, j| {
        let d = xs[i] - xs[j];
        d * d
    })
}
