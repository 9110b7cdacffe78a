//! Shared zero-mean GP training core.
//!
//! Both the discrepancy correction and the GP baseline train the same way:
//! gradient ascent on the marginal log-likelihood of the targets under an
//! RBF covariance plus observation noise, with every step rebuilding and
//! Cholesky-factorizing the covariance matrix. Hyperparameters live in log
//! space so ascent steps cannot leave the positive domain.
//!
//! Gradient of the marginal log-likelihood (Rasmussen & Williams eq. 5.9):
//!
//! ```text
//! dL/dp = 1/2 tr((alpha alpha^T - K^-1) dK/dp),  alpha = K^-1 y
//! ```

use nalgebra::{DMatrix, DVector};

use crate::domain::KernelSnapshot;
use crate::error::GrowthError;
use crate::math::{cholesky_with_jitter, log_determinant, squared_distances, RbfKernel};

/// Bound on log hyperparameters. Keeps a runaway ascent step finite without
/// constraining any realistic configuration.
const LOG_BOUND: f64 = 18.0;

/// Floor for the initial signal variance when targets are (near) constant.
const SIGNAL_VAR_FLOOR: f64 = 1e-6;

/// Posterior mean/variance at a single query age.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub mean: f64,
    pub variance: f64,
}

/// Zero-mean GP over scalar inputs with learnable RBF + noise
/// hyperparameters. Owns its training targets exclusively.
#[derive(Debug, Clone)]
pub struct GpCore {
    xs: Vec<f64>,
    targets: DVector<f64>,
    sq_dists: DMatrix<f64>,
    kernel: RbfKernel,
    log_noise_variance: f64,
    last_mll: Option<f64>,
}

impl GpCore {
    /// Build a training core over `(xs, targets)` pairs.
    ///
    /// The initial length scale is a quarter of the input span, the initial
    /// signal variance is the mean square of the targets, and the noise
    /// variance starts at `noise_init_value`.
    pub fn new(xs: &[f64], targets: &[f64], noise_init_value: f64) -> Result<Self, GrowthError> {
        if xs.len() != targets.len() {
            return Err(GrowthError::ShapeMismatch(format!(
                "{} inputs but {} targets",
                xs.len(),
                targets.len()
            )));
        }
        if xs.is_empty() {
            return Err(GrowthError::ShapeMismatch(
                "GP training requires at least one observation".to_string(),
            ));
        }
        if !(noise_init_value.is_finite() && noise_init_value > 0.0) {
            return Err(GrowthError::ShapeMismatch(format!(
                "noise_init_value must be finite and positive, got {noise_init_value}"
            )));
        }

        let span = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            - xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let length_scale = if span > 0.0 { span / 4.0 } else { 1.0 };
        let mean_square =
            targets.iter().map(|t| t * t).sum::<f64>() / targets.len() as f64;
        let signal_variance = mean_square.max(SIGNAL_VAR_FLOOR);

        Ok(Self {
            xs: xs.to_vec(),
            targets: DVector::from_row_slice(targets),
            sq_dists: squared_distances(xs),
            kernel: RbfKernel::new(length_scale, signal_variance),
            log_noise_variance: noise_init_value.ln(),
            last_mll: None,
        })
    }

    pub fn noise_variance(&self) -> f64 {
        self.log_noise_variance.exp()
    }

    /// Latent prior variance at any input (before conditioning on data).
    pub fn prior_variance(&self) -> f64 {
        self.kernel.signal_variance()
    }

    /// Marginal log-likelihood after the most recent ascent step.
    pub fn last_log_likelihood(&self) -> Option<f64> {
        self.last_mll
    }

    pub fn kernel_snapshot(&self) -> KernelSnapshot {
        KernelSnapshot {
            length_scale: self.kernel.length_scale(),
            signal_variance: self.kernel.signal_variance(),
            noise_variance: self.noise_variance(),
        }
    }

    /// Noisy covariance `K = K_f + sigma_n^2 I` for the current
    /// hyperparameters, plus the noise-free part.
    fn covariance(&self) -> (DMatrix<f64>, DMatrix<f64>) {
        let kf = self.kernel.covariance_from(&self.sq_dists);
        let mut k = kf.clone();
        let noise = self.noise_variance();
        for i in 0..self.xs.len() {
            k[(i, i)] += noise;
        }
        (kf, k)
    }

    /// One gradient-ascent step on the marginal log-likelihood. Returns the
    /// log-likelihood *before* the step.
    pub fn ascend_once(&mut self, learning_rate: f64) -> Result<f64, GrowthError> {
        let n = self.xs.len();
        let (kf, k) = self.covariance();
        let chol = cholesky_with_jitter(&k)?;
        let alpha = chol.solve(&self.targets);

        let mll = -0.5 * self.targets.dot(&alpha)
            - 0.5 * log_determinant(&chol)
            - 0.5 * n as f64 * (2.0 * std::f64::consts::PI).ln();

        // A = alpha alpha^T - K^-1, shared by all three gradients.
        let k_inv = chol.inverse();
        let a = &alpha * alpha.transpose() - k_inv;

        let dk_dlen = self.kernel.grad_log_length_scale(&self.sq_dists, &kf);
        let grad_len = 0.5 * a.component_mul(&dk_dlen).sum();
        let grad_sig = 0.5 * a.component_mul(&kf).sum();
        let grad_noise = 0.5 * self.noise_variance() * a.trace();

        self.kernel.log_length_scale = step(self.kernel.log_length_scale, learning_rate, grad_len);
        self.kernel.log_signal_variance =
            step(self.kernel.log_signal_variance, learning_rate, grad_sig);
        self.log_noise_variance = step(self.log_noise_variance, learning_rate, grad_noise);

        self.last_mll = Some(mll);
        Ok(mll)
    }

    /// Factorize the posterior at the current hyperparameters.
    pub fn posterior(&self) -> Result<GpPosterior, GrowthError> {
        let (_, k) = self.covariance();
        let chol = cholesky_with_jitter(&k)?;
        let alpha = chol.solve(&self.targets);
        Ok(GpPosterior {
            xs: self.xs.clone(),
            kernel: self.kernel,
            chol,
            alpha,
        })
    }
}

/// Apply one clamped ascent step; a non-finite gradient leaves the
/// parameter untouched rather than poisoning it.
fn step(param: f64, learning_rate: f64, grad: f64) -> f64 {
    if !grad.is_finite() {
        return param;
    }
    (param + learning_rate * grad).clamp(-LOG_BOUND, LOG_BOUND)
}

/// Frozen posterior of a trained GP core. Queries are pure; repeated calls
/// with identical inputs return identical results.
#[derive(Debug, Clone)]
pub struct GpPosterior {
    xs: Vec<f64>,
    kernel: RbfKernel,
    chol: nalgebra::Cholesky<f64, nalgebra::Dyn>,
    alpha: DVector<f64>,
}

impl GpPosterior {
    /// Posterior mean of the latent function at `x` (zero prior mean).
    pub fn mean_at(&self, x: f64) -> f64 {
        self.kernel.cross_vector(&self.xs, x).dot(&self.alpha)
    }

    /// Posterior variance of the latent function at `x`:
    /// `k(x, x) - k_*^T K^-1 k_*`, clamped at zero against rounding.
    pub fn variance_at(&self, x: f64) -> f64 {
        let k_star = self.kernel.cross_vector(&self.xs, x);
        let solved = self.chol.solve(&k_star);
        (self.kernel.signal_variance() - k_star.dot(&solved)).max(0.0)
    }
}
