//! loglik_optimizer — argmin-powered log-likelihood maximization.
//!
//! Purpose
//! -------
//! Provide the numerical workhorse behind model fitting and profiling:
//! callers implement [`LogLikelihood`] and call [`maximize`] (or
//! [`maximize_bounded`] for box-constrained parameters). Every profile point
//! is one such call on a restricted problem.
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into the Argmin cost
//!   `c(θ) = -ℓ(θ)` and supplies finite-difference gradients when the model
//!   has none.
//! - [`bounds::BoxedLogLikelihood`] re-expresses a model in unconstrained
//!   coordinates so unconstrained solvers respect [`Bounds`].
//! - [`builders`] and [`run`] construct and execute L-BFGS (More–Thuente or
//!   Hager–Zhang line search) or Nelder–Mead, normalizing results into an
//!   [`OptimOutcome`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer always maximizes `ℓ`; models never implement the cost.
//! - [`LogLikelihood::value`] and [`LogLikelihood::grad`] report invalid
//!   inputs as [`OptError`](crate::optimization::errors::OptError) values,
//!   never panics.
//! - [`Tolerances`] and [`MLEOptions`] are validated on construction.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; the `api` tests run every
//!   solver end to end on small concave problems.

pub mod adapter;
pub mod api;
pub mod bounds;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{maximize, maximize_bounded};
pub use self::bounds::Bounds;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Solver, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::{maximize, maximize_bounded};
    pub use super::bounds::Bounds;
    pub use super::traits::{LogLikelihood, MLEOptions, OptimOutcome, Solver, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
