//! Adapter that exposes a user `LogLikelihood` as an `argmin` problem.
//!
//! Maximization of `ℓ(θ)` becomes minimization of `c(θ) = -ℓ(θ)`. Analytic
//! gradients are negated; missing gradients are replaced by a
//! finite-difference gradient of the cost itself, which needs no sign flip.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user `LogLikelihood` to `argmin`'s `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }
}

impl<F: LogLikelihood> CostFunction for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Output = Cost;

    /// `c(θ) = -ℓ(θ)`; a non-finite `ℓ` is reported as `NonFiniteCost`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.f.value(theta, self.data)?;
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value }.into());
        }
        Ok(-value)
    }
}

impl<F: LogLikelihood> Gradient for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Gradient of the cost at `θ`.
    ///
    /// Uses `-∇ℓ(θ)` when the model provides it. On
    /// `OptError::GradientNotImplemented` a central difference of the cost is
    /// tried first; if any cost evaluation fails or the result is not finite,
    /// a forward difference is computed instead and its errors are returned.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => fd_gradient(theta, |t| self.cost(t)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Finite-difference gradient of a fallible scalar function.
///
/// `finitediff` needs an infallible `Fn(&Theta) -> f64`, so the first error
/// raised by `cost` is parked in a cell and the closure yields `NaN`.
fn fd_gradient<C>(theta: &Theta, cost: C) -> Result<Grad, Error>
where
    C: Fn(&Theta) -> Result<f64, Error>,
{
    let failure: RefCell<Option<Error>> = RefCell::new(None);
    let scalar = |t: &Theta| -> f64 {
        cost(t).unwrap_or_else(|e| {
            failure.borrow_mut().get_or_insert(e);
            f64::NAN
        })
    };

    let central = theta.central_diff(&scalar);
    if failure.borrow().is_none() && validate_grad(&central, theta.len()).is_ok() {
        return Ok(central);
    }

    failure.replace(None);
    let forward = theta.forward_diff(&scalar);
    if let Some(err) = failure.take() {
        return Err(err);
    }
    validate_grad(&forward, theta.len())?;
    Ok(forward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use ndarray::array;

    struct Bowl;

    impl LogLikelihood for Bowl {
        type Data = ();
        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            Ok(-0.5 * theta.dot(theta))
        }
        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    struct AnalyticBowl;

    impl LogLikelihood for AnalyticBowl {
        type Data = ();
        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            Ok(-0.5 * theta.dot(theta))
        }
        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            Ok(-theta.clone())
        }
    }

    struct HalfLine;

    impl LogLikelihood for HalfLine {
        type Data = ();
        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            if theta[0] < 0.0 {
                return Err(OptError::InvalidThetaInput { index: 0, value: theta[0] });
            }
            Ok(-theta[0])
        }
        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    fn cost_is_negated_log_likelihood() {
        let adapter = ArgMinAdapter::new(&Bowl, &());
        let c = adapter.cost(&array![1.0, 2.0]).expect("finite cost");
        assert!((c - 2.5).abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Analytic and finite-difference gradients of the cost agree.
    //
    // Given
    // -----
    // - The same quadratic with and without an analytic gradient.
    //
    // Expect
    // ------
    // - Both gradients equal `θ` (cost gradient of `-ℓ`) to FD accuracy.
    fn analytic_and_fd_gradients_agree() {
        let theta = array![0.3, -1.2];
        let fd = ArgMinAdapter::new(&Bowl, &()).gradient(&theta).expect("fd gradient");
        let exact = ArgMinAdapter::new(&AnalyticBowl, &()).gradient(&theta).expect("gradient");
        for i in 0..2 {
            assert!((fd[i] - theta[i]).abs() < 1e-6);
            assert!((exact[i] - theta[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn fd_falls_back_to_forward_difference_at_domain_edge() {
        // Central difference steps below zero and fails; forward stays inside.
        let g = ArgMinAdapter::new(&HalfLine, &()).gradient(&array![0.0]).expect("forward diff");
        assert!((g[0] - 1.0).abs() < 1e-6);
    }
}
