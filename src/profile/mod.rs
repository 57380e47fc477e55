//! profile — profile likelihoods, confidence intervals and regions.
//!
//! Purpose
//! -------
//! Given a model's log-likelihood, its data and its maximum-likelihood
//! estimate, trace the profile likelihood of single parameters (1-D) and of
//! parameter pairs (2-D), and read confidence intervals and regions off the
//! traced profiles.
//!
//! Key behaviors
//! -------------
//! - [`univariate::profile_univariate`] walks each parameter from the optimum
//!   towards both bounds, refilling sparse directions per
//!   [`options::RefillPolicy`], and assembles a [`results::ProfileSeries`].
//! - [`bivariate::profile_bivariate`] grows square layers of grid nodes
//!   around the optimum and assembles a [`results::ProfileSurface`].
//! - [`univariate::replace_profile`] and [`univariate::refine_profile`]
//!   update selected entries of existing results in place.
//! - Every profile point is a bounded maximization over the nuisance
//!   parameters with the profiled parameter(s) held fixed
//!   ([`restricted::RestrictedProblem`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - Profiled parameters need finite bounds; the optimum must lie inside the
//!   bounds. Both are checked before any optimizer call.
//! - The optimum is recorded exactly (profile `0` when normalised, `ℓ̂`
//!   otherwise); it is never re-solved.
//! - Stored series are strictly increasing in the parameter value.
//! - Configuration errors abort a request; numerical failures of one
//!   parameter (pair) are stored in [`results::ProfileResults::failures`].
//!
//! Conventions
//! -----------
//! - The threshold is `−q/2` for the χ² quantile `q` with 1 (univariate) or
//!   2 (bivariate) degrees of freedom, plus `ℓ̂` when profiles are not
//!   normalised.
//! - Progress is reported through the `log` facade: `info` per parameter,
//!   `debug` per direction or layer, `warn` on fallbacks.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule; `tests/` exercises the public
//!   drivers on quadratic, regression and bowl-shaped models.

pub mod bivariate;
pub mod contour;
pub mod errors;
pub mod interpolation;
pub mod options;
pub mod problem;
pub mod ranges;
pub mod restricted;
pub mod results;
pub mod roots;
pub mod strategy;
pub mod univariate;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bivariate::{GridNode, profile_bivariate, replace_surfaces};
pub use self::errors::{ProfileError, ProfileResult};
pub use self::options::{
    BivariateOptions, ConfidenceLevel, Execution, IntervalMethod, RefillPolicy, Resolution,
    UnivariateOptions,
};
pub use self::problem::{LikelihoodProblem, ModelOptimum, ParamNames};
pub use self::results::{
    BivariateResults, ConfidenceInterval, ConfidenceRegion, ProfileResults, ProfileSeries,
    ProfileSurface, UnivariateResults,
};
pub use self::strategy::{NextEstimate1D, NextEstimate2D};
pub use self::univariate::{
    ProfilePoint, profile_univariate, profile_univariate_by_name, refine_profile, replace_profile,
};

pub mod prelude {
    pub use super::bivariate::profile_bivariate;
    pub use super::errors::{ProfileError, ProfileResult};
    pub use super::options::{
        BivariateOptions, Execution, IntervalMethod, RefillPolicy, Resolution, UnivariateOptions,
    };
    pub use super::problem::{LikelihoodProblem, ModelOptimum};
    pub use super::strategy::{NextEstimate1D, NextEstimate2D};
    pub use super::univariate::{profile_univariate, refine_profile, replace_profile};
}
