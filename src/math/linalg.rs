//! Stable Cholesky factorization for GP covariance matrices.
//!
//! Hyperparameter training repeatedly factorizes `K + sigma_n^2 I`. During
//! gradient ascent the kernel can wander into configurations where the
//! matrix is numerically indefinite; instead of failing outright we add a
//! small diagonal jitter, growing it by a fixed factor for a bounded number
//! of retries. Exhausting the retries is a hard error for that training
//! step, never a silently degenerate posterior.

use nalgebra::{Cholesky, DMatrix, Dyn};

use crate::error::GrowthError;

/// Number of jitter retries before giving up on a factorization.
pub const MAX_JITTER_RETRIES: usize = 6;

/// Initial jitter, relative to the mean diagonal of the matrix.
const JITTER_REL: f64 = 1e-10;

/// Growth factor applied to the jitter on each retry.
const JITTER_GROWTH: f64 = 10.0;

/// Cholesky-factorize a symmetric matrix, adding bounded diagonal jitter
/// if it is not positive-definite as given.
pub fn cholesky_with_jitter(matrix: &DMatrix<f64>) -> Result<Cholesky<f64, Dyn>, GrowthError> {
    if let Some(chol) = Cholesky::new(matrix.clone()) {
        return Ok(chol);
    }

    let n = matrix.nrows();
    let mean_diag = matrix.diagonal().iter().map(|v| v.abs()).sum::<f64>() / n as f64;
    let mut jitter = JITTER_REL * mean_diag.max(1.0);

    for _ in 0..MAX_JITTER_RETRIES {
        let mut jittered = matrix.clone();
        for i in 0..n {
            jittered[(i, i)] += jitter;
        }
        if let Some(chol) = Cholesky::new(jittered) {
            return Ok(chol);
        }
        jitter *= JITTER_GROWTH;
    }

    Err(GrowthError::NumericalInstability {
        retries: MAX_JITTER_RETRIES,
    })
}

/// Log-determinant of the factorized matrix: `2 * sum(ln L_ii)`.
pub fn log_determinant(chol: &Cholesky<f64, Dyn>) -> f64 {
    2.0 * chol.l_dirty().diagonal().iter().map(|v| v.ln()).sum::<f64>()
}
