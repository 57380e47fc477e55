//! Bracketed scalar root finding on top of Argmin's Brent solver.
use crate::profile::errors::{ProfileError, ProfileResult};
use argmin::core::{CostFunction, Error, Executor, State};
use argmin::solver::brent::BrentRoot;

/// Iteration cap for a single bracket; Brent converges long before this.
const MAX_ROOT_ITERS: u64 = 200;

struct ScalarFn<'a> {
    f: &'a dyn Fn(f64) -> f64,
}

impl CostFunction for ScalarFn<'_> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, x: &f64) -> Result<f64, Error> {
        Ok((self.f)(*x))
    }
}

/// Find `x ∈ [lower, upper]` with `f(x) ≈ 0`.
///
/// The bracket may be given in either order. An endpoint where `f` is exactly
/// zero is returned as is.
///
/// # Errors
/// - [`ProfileError::RootNotBracketed`] if `f` does not change sign on the
///   bracket or is not finite at an endpoint.
/// - [`ProfileError::RootFindingFailed`] if Brent's method errors or returns
///   a point outside the bracket.
pub fn find_root(f: &dyn Fn(f64) -> f64, lower: f64, upper: f64, tol: f64) -> ProfileResult<f64> {
    let (a, b) = if lower <= upper { (lower, upper) } else { (upper, lower) };
    let (fa, fb) = (f(a), f(b));
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    if !fa.is_finite() || !fb.is_finite() || fa.signum() == fb.signum() {
        return Err(ProfileError::RootNotBracketed { lower: a, upper: b, f_lower: fa, f_upper: fb });
    }

    let solver = BrentRoot::new(a, b, tol);
    let result = Executor::new(ScalarFn { f }, solver)
        .configure(|state| state.max_iters(MAX_ROOT_ITERS))
        .run()
        .map_err(|e| ProfileError::RootFindingFailed { reason: e.to_string() })?;

    let state = result.state();
    let root = state
        .get_param()
        .copied()
        .or_else(|| state.get_best_param().copied())
        .ok_or_else(|| ProfileError::RootFindingFailed { reason: "no parameter reported".into() })?;
    if !root.is_finite() || root < a || root > b {
        return Err(ProfileError::RootFindingFailed {
            reason: format!("root {root} outside bracket [{a}, {b}]"),
        });
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_root_of_shifted_parabola_in_either_order() {
        let f = |x: f64| 1.92 - 0.5 * (x - 3.0) * (x - 3.0);
        let hi = find_root(&f, 3.0, 10.0, 1e-10).expect("bracketed");
        let lo = find_root(&f, 3.0, -10.0, 1e-10).expect("bracketed");
        let half_width = (2.0_f64 * 1.92).sqrt();
        assert!((hi - (3.0 + half_width)).abs() < 1e-6);
        assert!((lo - (3.0 - half_width)).abs() < 1e-6);
    }

    #[test]
    fn rejects_bracket_without_sign_change() {
        let f = |x: f64| x * x + 1.0;
        assert!(matches!(
            find_root(&f, -1.0, 1.0, 1e-8),
            Err(ProfileError::RootNotBracketed { .. })
        ));
    }

    #[test]
    fn exact_zero_at_endpoint_is_returned() {
        let f = |x: f64| x - 2.0;
        assert_eq!(find_root(&f, 2.0, 5.0, 1e-8), Ok(2.0));
    }
}
