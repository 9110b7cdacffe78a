//! Growth-curve model implementations.
//!
//! Models are implemented as small, pure functions so that fitting and
//! correction code can stay generic: everything outside this module sees
//! only `forward`, `initial_guess`, `param_len` and `display_name`.

pub mod model;

pub use model::*;
