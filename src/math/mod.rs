//! Mathematical utilities: RBF kernel evaluation and stable factorization.

pub mod kernel;
pub mod linalg;

pub use kernel::*;
pub use linalg::*;
