//! Execution helpers that run an `argmin` solver on a log-likelihood problem
//! and return a crate-friendly [`OptimOutcome`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        Grad, LogLikelihood, MLEOptions, OptimOutcome, Theta, adapter::ArgMinAdapter,
        types::NelderMeadSimplex,
    },
};
use argmin::core::{CostFunction, Executor, Gradient, IterState, State};
use argmin_math::ArgminL2Norm;

/// Run a gradient-based solver (L-BFGS with either line search).
///
/// `theta0` is set on the executor state; `opts.tols.max_iter` caps the
/// iterations. With `opts.verbose`, ℓ(θ₀) and ‖∇‖ are logged at `debug`.
///
/// # Errors
/// - Argmin runtime errors (line-search failures, cost errors raised by the
///   model) via `From<argmin::core::Error>`.
/// - Validation errors from [`OptimOutcome::new`].
pub fn run_lbfgs<'a, F, S>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: S,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: argmin::core::Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), (), (), f64>>,
{
    if opts.verbose {
        log_initial_state(&theta0, &problem, true);
    }
    let max_iter = opts.tols.max_iter;
    let result = Executor::new(problem, solver)
        .configure(|state| {
            let state = state.param(theta0);
            match max_iter {
                Some(n) => state.max_iters(n as u64),
                None => state,
            }
        })
        .run()?;

    let mut state = result.state().clone();
    let iterations = state.get_iter();
    let fn_evals = state.get_func_counts().clone();
    let termination = state.get_termination_status().clone();
    let grad = state.take_gradient();
    OptimOutcome::new(
        state.take_best_param(),
        -state.get_best_cost(),
        termination,
        iterations,
        fn_evals,
        grad,
    )
}

/// Run the derivative-free Nelder–Mead solver.
///
/// The starting simplex is already encoded in `solver`; only `max_iters` is
/// applied here. The outcome carries no gradient norm.
pub fn run_nelder_mead<'a, F>(
    theta0: &Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, F>, solver: NelderMeadSimplex,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
{
    if opts.verbose {
        log_initial_state(theta0, &problem, false);
    }
    let max_iter = opts.tols.max_iter;
    let result = Executor::new(problem, solver)
        .configure(|state| match max_iter {
            Some(n) => state.max_iters(n as u64),
            None => state,
        })
        .run()?;

    let mut state = result.state().clone();
    let iterations = state.get_iter();
    let fn_evals = state.get_func_counts().clone();
    let termination = state.get_termination_status().clone();
    OptimOutcome::new(
        state.take_best_param(),
        -state.get_best_cost(),
        termination,
        iterations,
        fn_evals,
        None,
    )
}

fn log_initial_state<F: LogLikelihood>(
    theta0: &Theta, problem: &ArgMinAdapter<'_, F>, with_grad: bool,
) {
    let ll0 = problem.cost(theta0).map(|c| -c);
    let g0 = if with_grad { problem.gradient(theta0).ok().map(|g| g.l2_norm()) } else { None };
    match (ll0, g0) {
        (Ok(ll), Some(n)) => log::debug!("init: ell(theta0) = {ll:.6}, ||grad|| = {n:.6}"),
        (Ok(ll), None) => log::debug!("init: ell(theta0) = {ll:.6}"),
        (Err(e), _) => log::debug!("init: ell(theta0) could not be evaluated: {e}"),
    }
}
