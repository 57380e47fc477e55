//! Box constraints for log-likelihood maximization.
//!
//! Argmin's L-BFGS and Nelder–Mead are unconstrained solvers. [`Bounds`]
//! describes a per-coordinate box `[lower_i, upper_i]` (either side may be
//! infinite) and [`BoxedLogLikelihood`] re-expresses a model in the
//! unconstrained coordinates `z` of
//! [`to_constrained`](crate::optimization::numerical_stability::to_constrained),
//! so any solver can work on it and every trial point stays inside the box.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
    },
    numerical_stability::{constrained_deriv, to_constrained, to_unconstrained},
};
use ndarray::{Array1, Zip};

/// Validated per-coordinate lower/upper bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl Bounds {
    /// Build bounds from lower and upper vectors.
    ///
    /// # Errors
    /// - [`OptError::BoundsDimMismatch`] if the vectors differ in length.
    /// - [`OptError::InvalidBounds`] if an entry is NaN or `lower > upper`.
    pub fn new(lower: Array1<f64>, upper: Array1<f64>) -> OptResult<Self> {
        if lower.len() != upper.len() {
            return Err(OptError::BoundsDimMismatch { expected: lower.len(), found: upper.len() });
        }
        for (index, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if lo.is_nan() || hi.is_nan() {
                return Err(OptError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                    reason: "Bounds must not be NaN.",
                });
            }
            if lo > hi {
                return Err(OptError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                    reason: "Lower bound exceeds upper bound.",
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Bounds of `dim` coordinates that are all `(-∞, ∞)`.
    pub fn unbounded(dim: usize) -> Self {
        Self {
            lower: Array1::from_elem(dim, f64::NEG_INFINITY),
            upper: Array1::from_elem(dim, f64::INFINITY),
        }
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    /// Whether `x` lies inside the box on every coordinate.
    pub fn contains(&self, x: &Theta) -> bool {
        x.len() == self.len()
            && Zip::from(x)
                .and(&self.lower)
                .and(&self.upper)
                .all(|&v, &lo, &hi| v >= lo && v <= hi)
    }

    /// Coordinate-wise projection of `x` onto the box.
    pub fn clamp(&self, x: &Theta) -> Theta {
        Zip::from(x).and(&self.lower).and(&self.upper).map_collect(|&v, &lo, &hi| v.clamp(lo, hi))
    }

    /// Restrict the bounds to the listed coordinates, in order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            lower: indices.iter().map(|&i| self.lower[i]).collect(),
            upper: indices.iter().map(|&i| self.upper[i]).collect(),
        }
    }

    /// Map a point of the box into unconstrained coordinates.
    pub fn to_unconstrained(&self, x: &Theta) -> Theta {
        Zip::from(x)
            .and(&self.lower)
            .and(&self.upper)
            .map_collect(|&v, &lo, &hi| to_unconstrained(v, lo, hi))
    }

    /// Map unconstrained coordinates back into the box.
    pub fn to_constrained(&self, z: &Theta) -> Theta {
        Zip::from(z)
            .and(&self.lower)
            .and(&self.upper)
            .map_collect(|&v, &lo, &hi| to_constrained(v, lo, hi))
    }

    pub(crate) fn check_dim(&self, dim: usize) -> OptResult<()> {
        if self.len() != dim {
            return Err(OptError::BoundsDimMismatch { expected: dim, found: self.len() });
        }
        Ok(())
    }
}

/// A log-likelihood evaluated in the unconstrained coordinates of a box.
///
/// `value(z) = ℓ(x(z))` and `grad(z) = ∇ℓ(x(z)) ⊙ dx/dz`. A model without an
/// analytic gradient keeps returning `GradientNotImplemented`, so finite
/// differences run in `z` space.
#[derive(Debug)]
pub struct BoxedLogLikelihood<'a, F: LogLikelihood> {
    inner: &'a F,
    bounds: &'a Bounds,
}

impl<'a, F: LogLikelihood> BoxedLogLikelihood<'a, F> {
    pub fn new(inner: &'a F, bounds: &'a Bounds) -> Self {
        Self { inner, bounds }
    }
}

impl<F: LogLikelihood> LogLikelihood for BoxedLogLikelihood<'_, F> {
    type Data = F::Data;

    fn value(&self, z: &Theta, data: &Self::Data) -> OptResult<Cost> {
        self.inner.value(&self.bounds.to_constrained(z), data)
    }

    fn check(&self, z: &Theta, data: &Self::Data) -> OptResult<()> {
        self.bounds.check_dim(z.len())?;
        self.inner.check(&self.bounds.to_constrained(z), data)
    }

    fn grad(&self, z: &Theta, data: &Self::Data) -> OptResult<Grad> {
        let g = self.inner.grad(&self.bounds.to_constrained(z), data)?;
        if g.len() != z.len() {
            return Err(OptError::GradientDimMismatch { expected: z.len(), found: g.len() });
        }
        Ok(Zip::from(&g)
            .and(z)
            .and(&self.bounds.lower)
            .and(&self.bounds.upper)
            .map_collect(|&gi, &zi, &lo, &hi| gi * constrained_deriv(zi, lo, hi)))
    }
}
