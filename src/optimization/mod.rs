//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer the profiling engine is built on: an
//! Argmin-backed log-likelihood maximizer with optional box constraints,
//! the numerically stable transforms behind those constraints, and a single
//! error/result surface.
//!
//! Key behaviors
//! -------------
//! - `loglik_optimizer`: maximize `ℓ(θ)` with L-BFGS or Nelder–Mead,
//!   optionally inside a box ([`loglik_optimizer::maximize_bounded`]).
//! - `numerical_stability`: softplus/logistic transforms that move bounded
//!   coordinates into unconstrained space.
//! - `errors`: normalize configuration issues, numerical failures and backend
//!   solver errors into [`errors::OptError`] / [`errors::OptResult`].
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; outcomes are
//!   reported in terms of `ℓ`.
//! - Public entrypoints return `OptResult<T>`; raw Argmin errors never leak.
//! - This layer does not perform I/O. Progress is reported only through the
//!   `log` facade when `MLEOptions::verbose` is set.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
