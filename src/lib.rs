//! profile_likelihood — profile likelihoods for maximum-likelihood models.
//!
//! Purpose
//! -------
//! Serve as the crate root. Callers describe a model through
//! [`optimization::loglik_optimizer::LogLikelihood`], fit it (or supply an
//! optimum of their own), and profile parameters or parameter pairs to obtain
//! confidence intervals and joint confidence regions.
//!
//! Key behaviors
//! -------------
//! - `optimization`: Argmin-backed bounded maximization of `ℓ(θ)` and the
//!   transforms it relies on.
//! - `profile`: restricted problems, univariate endpoint finding, bivariate
//!   layer expansion, interpolation and interval/region extraction.
//!
//! Conventions
//! -----------
//! - Log-likelihoods are maximized; optimizer internals minimize `−ℓ`.
//! - Fallible entry points return module-specific results
//!   ([`optimization::errors::OptResult`], [`profile::ProfileResult`]).
//! - Diagnostics go through the `log` facade; install any logger to see them.
//!
//! Downstream usage
//! ----------------
//! ```no_run
//! use profile_likelihood::prelude::*;
//! # fn run<F: LogLikelihood + Sync>(problem: LikelihoodProblem<F>) -> ProfileResult<()>
//! # where F::Data: Sync {
//! let optimum = problem.fit(&MLEOptions::default())?;
//! let opts = UnivariateOptions::default().with_confidence_level(0.95)?;
//! let results = profile_univariate(&problem, &optimum, &[0], &opts)?;
//! if let Some(series) = results.get(&0) {
//!     println!("{:?}", series.interval());
//! }
//! # Ok(())
//! # }
//! ```

pub mod optimization;
pub mod profile;

pub mod prelude {
    pub use crate::optimization::prelude::*;
    pub use crate::profile::prelude::*;
}
