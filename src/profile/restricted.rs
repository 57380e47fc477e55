//! Restricted problems: the log-likelihood over the free (nuisance)
//! parameters with one or two parameters held fixed.
//!
//! A [`ProblemTemplate`] is built once per profiled parameter (pair) and is
//! shared read-only between workers. Each worker calls
//! [`ProblemTemplate::instantiate`] to get its own [`RestrictedProblem`],
//! which owns the full-size scratch vector (fixed slots plus free slots) and
//! the reduced-size initial guess. The scratch lives in a `RefCell`, so a
//! `RestrictedProblem` is not `Sync` and cannot be shared across threads.
use std::cell::RefCell;

use crate::{
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Bounds, Cost, Grad, LogLikelihood, MLEOptions, Theta, maximize_bounded},
    },
    profile::{
        errors::{ProfileError, ProfileResult},
        problem::{LikelihoodProblem, ModelOptimum},
    },
};

/// Parameter indices held fixed in a restricted problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FixedIndices {
    Single(usize),
    Pair(usize, usize),
}

impl FixedIndices {
    pub fn indices(&self) -> Vec<usize> {
        match *self {
            FixedIndices::Single(i) => vec![i],
            FixedIndices::Pair(i, j) => vec![i, j],
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        match *self {
            FixedIndices::Single(i) => i == index,
            FixedIndices::Pair(i, j) => i == index || j == index,
        }
    }
}

/// Outcome of one restricted solve.
#[derive(Debug, Clone, PartialEq)]
pub struct RestrictedSolution {
    /// `ℓ̂_restricted − shift`.
    pub profile: f64,
    /// Solved free parameters, in index order.
    pub nuisance: Theta,
    /// Whether the optimizer reported convergence.
    pub converged: bool,
}

/// Shared description of a restricted problem.
pub struct ProblemTemplate<'a, F: LogLikelihood> {
    problem: &'a LikelihoodProblem<F>,
    fixed: FixedIndices,
    free: Vec<usize>,
    free_bounds: Bounds,
    base: Theta,
    shift: f64,
    opts: &'a MLEOptions,
}

impl<'a, F: LogLikelihood> ProblemTemplate<'a, F> {
    /// # Errors
    /// - [`ProfileError::IndexOutOfRange`] for an index past the model size.
    /// - [`ProfileError::DuplicateIndices`] for a pair repeating one index.
    pub fn new(
        problem: &'a LikelihoodProblem<F>, optimum: &ModelOptimum, fixed: FixedIndices, shift: f64,
        opts: &'a MLEOptions,
    ) -> ProfileResult<Self> {
        let n = problem.n_params();
        for i in fixed.indices() {
            if i >= n {
                return Err(ProfileError::IndexOutOfRange { index: i, n_params: n });
            }
        }
        if let FixedIndices::Pair(i, j) = fixed {
            if i == j {
                return Err(ProfileError::DuplicateIndices { index: i });
            }
        }
        let free: Vec<usize> = (0..n).filter(|&i| !fixed.contains(i)).collect();
        let free_bounds = problem.bounds().select(&free);
        Ok(Self {
            problem,
            fixed,
            free,
            free_bounds,
            base: optimum.theta_hat().clone(),
            shift,
            opts,
        })
    }

    /// A fresh restricted problem for one worker, seeded at the optimum.
    pub fn instantiate(&self) -> RestrictedProblem<'_, F> {
        RestrictedProblem {
            template: self,
            full: RefCell::new(self.base.clone()),
            guess: self.optimum_nuisance(),
        }
    }

    /// Free coordinates of the optimum.
    pub fn optimum_nuisance(&self) -> Theta {
        self.reduce(&self.base)
    }

    /// Select the free coordinates of a full parameter vector.
    pub fn reduce(&self, full: &Theta) -> Theta {
        self.free.iter().map(|&i| full[i]).collect()
    }

    pub fn n_free(&self) -> usize {
        self.free.len()
    }

    pub fn free_bounds(&self) -> &Bounds {
        &self.free_bounds
    }
}

/// The log-likelihood as a function of the free parameters only.
///
/// Every evaluation writes the free coordinates into the full scratch vector
/// and reads the fixed slots as they currently are, so one instance can be
/// re-fixed and solved many times.
pub struct RestrictedProblem<'t, F: LogLikelihood> {
    template: &'t ProblemTemplate<'t, F>,
    full: RefCell<Theta>,
    guess: Theta,
}

impl<F: LogLikelihood> RestrictedProblem<'_, F> {
    /// Set the fixed slot(s), in the order of [`FixedIndices::indices`].
    pub fn fix(&mut self, values: &[f64]) {
        let full = self.full.get_mut();
        for (i, &v) in self.template.fixed.indices().into_iter().zip(values) {
            full[i] = v;
        }
    }

    /// Set the initial guess for the next solve.
    pub fn set_guess(&mut self, guess: Theta) {
        self.guess = guess;
    }

    /// Maximize over the free parameters from the current guess.
    ///
    /// With no free parameters the objective is evaluated once. If the
    /// optimizer errors, the objective is evaluated at the (clamped) guess and
    /// recorded with `converged = false`; only if that evaluation also fails
    /// is [`ProfileError::Optimization`] returned.
    pub fn solve(&self) -> ProfileResult<RestrictedSolution> {
        let t = self.template;
        let data = t.problem.data();
        let fixed_value = self.full.borrow()[t.fixed.indices()[0]];
        match maximize_bounded(self, &self.guess, data, &t.free_bounds, t.opts) {
            Ok(out) => Ok(RestrictedSolution {
                profile: out.value - t.shift,
                nuisance: out.theta_hat,
                converged: out.converged,
            }),
            Err(source) => {
                log::warn!(
                    "restricted solve failed at {:?} = {fixed_value}: {source}; \
                     keeping initial guess",
                    t.fixed
                );
                let guess = t.free_bounds.clamp(&self.guess);
                match self.value(&guess, data) {
                    Ok(v) if v.is_finite() => Ok(RestrictedSolution {
                        profile: v - t.shift,
                        nuisance: guess,
                        converged: false,
                    }),
                    _ => Err(ProfileError::Optimization { value: fixed_value, source }),
                }
            }
        }
    }

    fn write_free(&self, z: &Theta) -> OptResult<()> {
        let free = &self.template.free;
        if z.len() != free.len() {
            return Err(OptError::ThetaLengthMismatch { expected: free.len(), actual: z.len() });
        }
        let mut full = self.full.borrow_mut();
        for (k, &i) in free.iter().enumerate() {
            full[i] = z[k];
        }
        Ok(())
    }
}

impl<F: LogLikelihood> LogLikelihood for RestrictedProblem<'_, F> {
    type Data = F::Data;

    fn value(&self, z: &Theta, data: &Self::Data) -> OptResult<Cost> {
        self.write_free(z)?;
        self.template.problem.loglik().value(&self.full.borrow(), data)
    }

    fn check(&self, z: &Theta, data: &Self::Data) -> OptResult<()> {
        self.write_free(z)?;
        self.template.problem.loglik().check(&self.full.borrow(), data)
    }

    fn grad(&self, z: &Theta, data: &Self::Data) -> OptResult<Grad> {
        self.write_free(z)?;
        let g = self.template.problem.loglik().grad(&self.full.borrow(), data)?;
        Ok(self.template.reduce(&g))
    }
}
