//! The fitted model the engine profiles.
//!
//! - [`LikelihoodProblem`]: a model's log-likelihood with its data, bounds,
//!   parameter names and a starting point.
//! - [`ModelOptimum`]: the maximum-likelihood estimate and its log-likelihood.
//! - [`ParamNames`]: name ↔ index lookup built once per problem.
use std::collections::HashMap;

use crate::{
    optimization::loglik_optimizer::{Bounds, LogLikelihood, MLEOptions, Theta, maximize_bounded},
    profile::errors::{ProfileError, ProfileResult},
};

/// Declared parameter names with a reverse lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamNames {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl ParamNames {
    /// # Errors
    /// [`ProfileError::DuplicateParameterName`] if a name repeats.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> ProfileResult<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut lookup = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            if lookup.insert(name.clone(), index).is_some() {
                return Err(ProfileError::DuplicateParameterName { name: name.clone() });
            }
        }
        Ok(Self { names, lookup })
    }

    /// Positional names `theta[0]`, `theta[1]`, ….
    pub fn positional(n: usize) -> Self {
        let names: Vec<String> = (0..n).map(|i| format!("theta[{i}]")).collect();
        let lookup = names.iter().cloned().enumerate().map(|(i, n)| (n, i)).collect();
        Self { names, lookup }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> ProfileResult<usize> {
        self.lookup
            .get(name)
            .copied()
            .ok_or_else(|| ProfileError::UnknownParameterName { name: name.to_string() })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Maximum-likelihood estimate of a model.
///
/// Owned and immutable: the engine only ever borrows it, so concurrent
/// workers share one copy.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptimum {
    theta_hat: Theta,
    max_loglik: f64,
}

impl ModelOptimum {
    /// # Errors
    /// [`ProfileError::NonFiniteOptimum`] if any coordinate or the value is
    /// not finite.
    pub fn new(theta_hat: Theta, max_loglik: f64) -> ProfileResult<Self> {
        if let Some(i) = theta_hat.iter().position(|v| !v.is_finite()) {
            return Err(ProfileError::NonFiniteOptimum { index: Some(i), value: theta_hat[i] });
        }
        if !max_loglik.is_finite() {
            return Err(ProfileError::NonFiniteOptimum { index: None, value: max_loglik });
        }
        Ok(Self { theta_hat, max_loglik })
    }

    pub fn theta_hat(&self) -> &Theta {
        &self.theta_hat
    }

    pub fn max_loglik(&self) -> f64 {
        self.max_loglik
    }

    pub fn n_params(&self) -> usize {
        self.theta_hat.len()
    }
}

/// A model's log-likelihood bundled with everything profiling needs.
///
/// `F` and `F::Data` are shared read-only across workers in parallel mode,
/// which is why the drivers require both to be `Sync`.
pub struct LikelihoodProblem<F: LogLikelihood> {
    loglik: F,
    data: F::Data,
    bounds: Bounds,
    names: ParamNames,
    theta0: Theta,
}

impl<F: LogLikelihood> LikelihoodProblem<F> {
    /// Bundle a model with its data, bounds and starting point.
    ///
    /// Parameters get positional names; see [`Self::with_names`].
    ///
    /// # Errors
    /// [`ProfileError::DimensionMismatch`] if `bounds` and `theta0` differ in length.
    pub fn new(loglik: F, data: F::Data, bounds: Bounds, theta0: Theta) -> ProfileResult<Self> {
        if bounds.len() != theta0.len() {
            return Err(ProfileError::DimensionMismatch {
                what: "bounds",
                expected: theta0.len(),
                found: bounds.len(),
            });
        }
        let names = ParamNames::positional(theta0.len());
        Ok(Self { loglik, data, bounds, names, theta0 })
    }

    /// Replace the positional names with declared ones.
    pub fn with_names<S: Into<String>>(
        mut self, names: impl IntoIterator<Item = S>,
    ) -> ProfileResult<Self> {
        let names = ParamNames::new(names)?;
        if names.len() != self.n_params() {
            return Err(ProfileError::DimensionMismatch {
                what: "parameter names",
                expected: self.n_params(),
                found: names.len(),
            });
        }
        self.names = names;
        Ok(self)
    }

    pub fn loglik(&self) -> &F {
        &self.loglik
    }

    pub fn data(&self) -> &F::Data {
        &self.data
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn names(&self) -> &ParamNames {
        &self.names
    }

    pub fn theta0(&self) -> &Theta {
        &self.theta0
    }

    pub fn n_params(&self) -> usize {
        self.theta0.len()
    }

    /// Evaluate `ℓ(θ)` on the full parameter vector.
    pub fn evaluate(&self, theta: &Theta) -> ProfileResult<f64> {
        Ok(self.loglik.value(theta, &self.data)?)
    }

    /// Maximize the log-likelihood from `theta0` within the bounds.
    ///
    /// # Errors
    /// [`ProfileError::Optimizer`] for any optimizer failure.
    pub fn fit(&self, opts: &MLEOptions) -> ProfileResult<ModelOptimum> {
        let outcome = maximize_bounded(&self.loglik, &self.theta0, &self.data, &self.bounds, opts)?;
        log::info!(
            "fitted {} parameters: ell = {:.6} after {} iterations ({})",
            self.n_params(),
            outcome.value,
            outcome.iterations,
            outcome.status
        );
        ModelOptimum::new(outcome.theta_hat, outcome.value)
    }

    /// Check that `optimum` fits this problem: same length, inside the bounds.
    pub fn check_optimum(&self, optimum: &ModelOptimum) -> ProfileResult<()> {
        if optimum.n_params() != self.n_params() {
            return Err(ProfileError::DimensionMismatch {
                what: "optimum",
                expected: self.n_params(),
                found: optimum.n_params(),
            });
        }
        let (lower, upper) = (self.bounds.lower(), self.bounds.upper());
        for (index, &value) in optimum.theta_hat().iter().enumerate() {
            if value < lower[index] || value > upper[index] {
                return Err(ProfileError::OptimumOutsideBounds {
                    index,
                    value,
                    lower: lower[index],
                    upper: upper[index],
                });
            }
        }
        Ok(())
    }

    /// Check that a parameter index exists and has finite bounds.
    pub fn check_profilable(&self, index: usize) -> ProfileResult<()> {
        if index >= self.n_params() {
            return Err(ProfileError::IndexOutOfRange { index, n_params: self.n_params() });
        }
        let (lower, upper) = (self.bounds.lower()[index], self.bounds.upper()[index]);
        if !lower.is_finite() || !upper.is_finite() {
            return Err(ProfileError::InfiniteBound {
                index,
                name: self.names.name(index).unwrap_or_default().to_string(),
                lower,
                upper,
            });
        }
        Ok(())
    }
}
