//! High-level entry points for maximizing a user-provided `LogLikelihood`.
//!
//! [`maximize`] runs the configured solver directly on `θ`;
//! [`maximize_bounded`] first moves the problem into the unconstrained
//! coordinates of a [`Bounds`] box and maps the optimum back.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        bounds::{Bounds, BoxedLogLikelihood},
        builders::{build_nelder_mead, build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::{run_lbfgs, run_nelder_mead},
        traits::{LineSearcher, LogLikelihood, MLEOptions, Solver},
        validation::validate_theta_input,
    },
};

/// Maximize a log-likelihood `ℓ(θ)` with the solver chosen in `opts`.
///
/// # Behavior
/// - Rejects non-finite starting points and calls `f.check(theta0, data)`.
/// - An empty `theta0` is evaluated once and returned without running a solver.
/// - Otherwise wraps `(f, data)` in an [`ArgMinAdapter`] and dispatches on
///   `opts.solver`.
///
/// # Errors
/// - Propagates errors from `f.check`, solver construction and execution.
///
/// # Example
/// ```no_run
/// use ndarray::array;
/// use profile_likelihood::optimization::errors::OptResult;
/// use profile_likelihood::optimization::loglik_optimizer::{
///     maximize, LogLikelihood, MLEOptions, Theta,
/// };
///
/// struct Bowl;
/// impl LogLikelihood for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Bowl, array![0.1, -0.2, 0.3], &(), &MLEOptions::default())?;
/// println!("θ̂ = {:?}", out.theta_hat);
/// # Ok::<(), profile_likelihood::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    validate_theta_input(&theta0)?;
    f.check(&theta0, data)?;
    if theta0.is_empty() {
        let value = f.value(&theta0, data)?;
        return OptimOutcome::from_evaluation(theta0, value);
    }
    let problem = ArgMinAdapter::new(f, data);
    match opts.solver {
        Solver::Lbfgs(LineSearcher::MoreThuente) => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        Solver::Lbfgs(LineSearcher::HagerZhang) => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        Solver::NelderMead => {
            let solver = build_nelder_mead(&theta0, opts)?;
            run_nelder_mead(&theta0, opts, problem, solver)
        }
    }
}

/// Maximize `ℓ(θ)` subject to `bounds.lower ≤ θ ≤ bounds.upper`.
///
/// `theta0` is clamped into the box before the transform, so a start on
/// (or slightly outside) an edge is accepted. The returned `theta_hat` is
/// expressed in the original coordinates.
///
/// # Errors
/// - [`OptError::BoundsDimMismatch`] if `bounds` and `theta0` differ in length.
/// - Everything [`maximize`] can return.
///
/// [`OptError::BoundsDimMismatch`]: crate::optimization::errors::OptError::BoundsDimMismatch
pub fn maximize_bounded<F: LogLikelihood>(
    f: &F, theta0: &Theta, data: &F::Data, bounds: &Bounds, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    bounds.check_dim(theta0.len())?;
    validate_theta_input(theta0)?;
    let boxed = BoxedLogLikelihood::new(f, bounds);
    let z0 = bounds.to_unconstrained(&bounds.clamp(theta0));
    let mut outcome = maximize(&boxed, z0, data, opts)?;
    outcome.theta_hat = bounds.to_constrained(&outcome.theta_hat);
    Ok(outcome)
}
