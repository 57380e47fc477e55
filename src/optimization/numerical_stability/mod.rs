//! numerical_stability — numerically robust scalar transforms.
//!
//! Purpose
//! -------
//! Collect numerically stable scalar transforms used by the optimizer layer
//! to move between bounded parameter space and the unconstrained space in
//! which Argmin's solvers operate.
//!
//! Key behaviors
//! -------------
//! - Provide stable scalar transforms (`safe_softplus`, its inverse, and
//!   `safe_logistic`) for mapping unconstrained reals into strictly
//!   positive or (0, 1) quantities without overflow/underflow.
//! - Provide the per-coordinate box transform (`to_unconstrained`,
//!   `to_constrained`, `constrained_deriv`) for one-sided, two-sided and
//!   unbounded parameters.
//!
//! Invariants & assumptions
//! ------------------------
//! - All public transforms assume finite `f64` inputs for the coordinate
//!   itself; bounds may be infinite.
//! - Bound validation (`lower ≤ upper`, no NaN) is enforced by
//!   `loglik_optimizer::Bounds`, not here.
//!
//! Conventions
//! -----------
//! - This module never logs, performs I/O, or touches global state; it is
//!   pure numerical helpers suitable for use inside tight inner loops.
//!
//! Testing notes
//! -------------
//! - Unit tests in [`transformations`] cover agreement with naïve formulas,
//!   tail behavior, box round trips, and the derivative of the box map.

pub mod transformations;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::transformations::{
    LOGIT_EPS, constrained_deriv, safe_logistic, safe_softplus, safe_softplus_inv,
    to_constrained, to_unconstrained,
};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::transformations::{
        LOGIT_EPS, safe_logistic, safe_softplus, safe_softplus_inv, to_constrained,
        to_unconstrained,
    };
}
