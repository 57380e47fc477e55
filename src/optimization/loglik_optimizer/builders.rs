//! loglik_optimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Hide Argmin's generic wiring behind small builders that apply the
//! crate-level [`MLEOptions`] (tolerances, L-BFGS memory, simplex size).
//!
//! Conventions
//! -----------
//! - L-BFGS builders never set the initial parameter or `max_iters`; the
//!   runner applies those to the executor state.
//! - The Nelder–Mead builder needs the starting point because the initial
//!   simplex is part of the solver, not of the state.
//! - Argmin configuration errors surface as [`OptError`] through
//!   `From<argmin::core::Error>`.
//!
//! [`OptError`]: crate::optimization::errors::OptError
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        traits::MLEOptions,
        types::{
            Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
            MoreThuenteLS, NelderMeadSimplex, Theta,
        },
    },
};

/// L-BFGS with the Hager–Zhang line search.
pub fn build_optimizer_hager_zhang(opts: &MLEOptions) -> OptResult<LbfgsHagerZhang> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsHagerZhang::new(HagerZhangLS::new(), mem), opts)
}

/// L-BFGS with the More–Thuente line search.
pub fn build_optimizer_more_thuente(opts: &MLEOptions) -> OptResult<LbfgsMoreThuente> {
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    configure_lbfgs(LbfgsMoreThuente::new(MoreThuenteLS::new(), mem), opts)
}

/// Apply the optional gradient and cost tolerances to any L-BFGS variant.
///
/// A `None` tolerance leaves Argmin's default in place.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &MLEOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Nelder–Mead started from the simplex `{z0, z0 + h·e_1, …, z0 + h·e_n}`.
///
/// `h` is `opts.simplex_step`. The standard-deviation stopping rule uses
/// `tol_grad` when set, else `tol_cost`, else Argmin's default.
pub fn build_nelder_mead(z0: &Theta, opts: &MLEOptions) -> OptResult<NelderMeadSimplex> {
    let mut vertices = Vec::with_capacity(z0.len() + 1);
    vertices.push(z0.clone());
    for i in 0..z0.len() {
        let mut v = z0.clone();
        v[i] += opts.simplex_step;
        vertices.push(v);
    }
    let mut solver = NelderMeadSimplex::new(vertices);
    if let Some(tol) = opts.tols.tol_grad.or(opts.tols.tol_cost) {
        solver = solver.with_sd_tolerance(tol)?;
    }
    Ok(solver)
}
