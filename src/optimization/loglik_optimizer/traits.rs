//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait users implement for their model.
//! - [`MLEOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`Solver`] / [`LineSearcher`]: which Argmin solver runs a maximization.
//! - [`OptimOutcome`]: normalized result returned by `maximize`.
//!
//! Convention: we *maximize* a user log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)`. If an analytic gradient is provided, it should be the gradient
//! of the log-likelihood (`∇ℓ(θ)`); the adapter flips the sign as needed.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, FnEvalMap, Grad, Theta,
        types::DEFAULT_SIMPLEX_STEP,
        validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
    },
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// User-implemented log-likelihood interface.
///
/// You maximize `ℓ(θ)`; internally we minimize the cost `c(θ) = -ℓ(θ)`.
/// If you provide an analytic gradient, return the gradient of the
/// log-likelihood `∇ℓ(θ)` (the adapter flips the sign to match the cost).
///
/// - `type Data`: per-model data carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: validation hook called once
///   before optimization.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇ℓ(θ)`.
///   If not implemented, finite differences are used automatically.
///
/// Profiling evaluates the same log-likelihood from several worker threads,
/// so implementors used with parallel execution must also be `Sync`.
pub trait LogLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`); unknown
/// names return `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Argmin solver used for a maximization.
///
/// Variants:
/// - `Lbfgs(LineSearcher)`: quasi-Newton with analytic or finite-difference
///   gradients.
/// - `NelderMead`: derivative-free simplex search; useful when the
///   log-likelihood is noisy (e.g. evaluated through an ODE integrator).
///
/// Parsing accepts `"lbfgs"` (More–Thuente), `"lbfgs-hagerzhang"`,
/// `"lbfgs-morethuente"` and `"neldermead"`, case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Solver {
    Lbfgs(LineSearcher),
    NelderMead,
}

impl FromStr for Solver {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase().replace(['_', ' '], "-");
        match lowered.as_str() {
            "lbfgs" => Ok(Solver::Lbfgs(LineSearcher::MoreThuente)),
            "neldermead" | "nelder-mead" => Ok(Solver::NelderMead),
            other => match other.strip_prefix("lbfgs-") {
                Some(ls) => Ok(Solver::Lbfgs(ls.parse()?)),
                None => Err(OptError::InvalidSolver {
                    name: s.to_string(),
                    reason: "Valid options are 'lbfgs', 'lbfgs-<linesearch>' or 'neldermead'.",
                }),
            },
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `solver: Solver` — Argmin solver (L-BFGS with a line search, or Nelder–Mead).
/// - `verbose: bool` — if `true`, the initial state of every run is logged
///   at `debug` level.
/// - `lbfgs_mem: Option<usize>` — L-BFGS history (default 7).
/// - `simplex_step: f64` — initial Nelder–Mead simplex edge in unconstrained space.
///
/// Default:
/// - `tols`: `tol_grad = 1e-8`, `tol_cost = 1e-12`, `max_iter = 300`
/// - `solver`: L-BFGS with More–Thuente
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub solver: Solver,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
    pub simplex_step: f64,
}

impl MLEOptions {
    /// Create a new set of optimizer options.
    ///
    /// # Errors
    /// - [`OptError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, solver: Solver, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, solver, verbose, lbfgs_mem, simplex_step: DEFAULT_SIMPLEX_STEP })
    }

    /// Override the initial Nelder–Mead simplex edge length.
    ///
    /// # Errors
    /// - [`OptError::InvalidSimplexStep`] unless `step` is finite and `> 0`.
    pub fn with_simplex_step(mut self, step: f64) -> OptResult<Self> {
        if !step.is_finite() || step <= 0.0 {
            return Err(OptError::InvalidSimplexStep {
                step,
                reason: "Simplex step must be finite and positive.",
            });
        }
        self.simplex_step = step;
        Ok(self)
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-8), tol_cost: Some(1e-12), max_iter: Some(300) },
            solver: Solver::Lbfgs(LineSearcher::MoreThuente),
            verbose: false,
            lbfgs_mem: None,
            simplex_step: DEFAULT_SIMPLEX_STEP,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold
///   (for Nelder–Mead: the simplex standard-deviation tolerance).
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by `maximize`.
///
/// - `theta_hat`: best parameter vector found.
/// - `value`: best **log-likelihood** value `ℓ(θ)` (not the cost).
/// - `converged`: `true` if the solver reported a terminating status other
///   than `NotTerminated` / `MaxItersReached`.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus,
        iterations: u64, fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let status = match &termination {
            TerminationStatus::NotTerminated => "Not terminated".to_string(),
            other => format!("{other:?}"),
        };
        let converged = matches!(
            termination,
            TerminationStatus::Terminated(ref reason)
                if !matches!(reason, argmin::core::TerminationReason::MaxItersReached)
        );
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }

    /// Outcome of a "solve" with no free parameters: a single evaluation.
    pub fn from_evaluation(theta: Theta, value: f64) -> OptResult<Self> {
        validate_value(value)?;
        let mut fn_evals = FnEvalMap::new();
        fn_evals.insert("cost_count".to_string(), 1);
        Ok(Self {
            theta_hat: theta,
            value,
            converged: true,
            status: "No free parameters".to_string(),
            iterations: 0,
            fn_evals,
            grad_norm: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Parsing of `LineSearcher` and `Solver` names.
    // - Validation performed by `Tolerances::new` and `MLEOptions::new`.
    // - The zero-parameter `OptimOutcome::from_evaluation` constructor.
    // -------------------------------------------------------------------------

    #[test]
    fn solver_parses_case_insensitive_names() {
        assert_eq!("LBFGS".parse::<Solver>(), Ok(Solver::Lbfgs(LineSearcher::MoreThuente)));
        assert_eq!(
            "lbfgs-HagerZhang".parse::<Solver>(),
            Ok(Solver::Lbfgs(LineSearcher::HagerZhang))
        );
        assert_eq!("Nelder_Mead".parse::<Solver>(), Ok(Solver::NelderMead));
        assert!(matches!("bfgs".parse::<Solver>(), Err(OptError::InvalidSolver { .. })));
        assert!(matches!(
            "lbfgs-armijo".parse::<Solver>(),
            Err(OptError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // `Tolerances::new` rejects empty and invalid configurations.
    //
    // Given
    // -----
    // - All-`None` tolerances, a negative gradient tolerance, zero max_iter.
    //
    // Expect
    // ------
    // - The matching `OptError` variant for each case.
    fn tolerances_new_rejects_invalid_inputs() {
        assert_eq!(Tolerances::new(None, None, None), Err(OptError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(Some(-1.0), None, None),
            Err(OptError::InvalidTolGrad { .. })
        ));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(OptError::InvalidMaxIter { .. })
        ));
    }

    #[test]
    fn mle_options_rejects_zero_memory_and_bad_simplex_step() {
        let tols = Tolerances::new(Some(1e-6), None, Some(10)).expect("valid tolerances");
        assert!(matches!(
            MLEOptions::new(tols, Solver::NelderMead, false, Some(0)),
            Err(OptError::InvalidLBFGSMem { .. })
        ));
        let opts = MLEOptions::new(tols, Solver::NelderMead, false, None).expect("valid options");
        assert!(matches!(
            opts.with_simplex_step(0.0),
            Err(OptError::InvalidSimplexStep { .. })
        ));
    }

    #[test]
    fn from_evaluation_marks_single_cost_call() {
        let out = OptimOutcome::from_evaluation(Theta::zeros(0), -1.5).expect("finite value");
        assert!(out.converged);
        assert_eq!(out.fn_evals.get("cost_count"), Some(&1));
        assert!(OptimOutcome::from_evaluation(Theta::zeros(0), f64::NAN).is_err());
    }
}
