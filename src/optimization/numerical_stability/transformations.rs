//! Numerical stability utilities.
//!
//! Provides safe implementations of common nonlinear transforms
//! that are prone to overflow/underflow in naïve form, plus the
//! box transform used to optimize bounded parameters in an
//! unconstrained space.
//!
//! # Provided items
//! - [`LOGIT_EPS`]: clamp margin keeping logits finite at the edges of a box.
//! - [`safe_softplus(x)`]: stable version of `ln(1 + exp(x))`,
//!   mapping ℝ → (0, ∞) without overflow.
//! - [`safe_softplus_inv(x)`]: inverse of softplus, mapping
//!   (0, ∞) → ℝ without catastrophic cancellation.
//! - [`safe_logistic(x)`]: `1 / (1 + exp(-x))` evaluated on the stable side.
//! - [`to_unconstrained`], [`to_constrained`], [`constrained_deriv`]: the
//!   per-coordinate box transform `x ∈ [lb, ub] ↔ z ∈ ℝ`.
//!
//! # Box transform
//! | bounds            | x(z)                       | dx/dz              |
//! |-------------------|----------------------------|--------------------|
//! | `[lb, ub]` finite | `lb + (ub − lb)·σ(z)`      | `(ub − lb)·σ(1−σ)` |
//! | `[lb, ∞)`         | `lb + softplus(z)`         | `σ(z)`             |
//! | `(−∞, ub]`        | `ub − softplus(z)`         | `−σ(z)`            |
//! | `(−∞, ∞)`         | `z`                        | `1`                |

/// Clamp margin for logits and softplus inverses.
///
/// Points lying exactly on a finite bound are nudged inside by this relative
/// amount so that their unconstrained image stays finite.
pub const LOGIT_EPS: f64 = 1e-10;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// - For sufficiently large `x`, `softplus(x) ≈ x + ln1p(exp(-x)) ≈ x`.
/// - Otherwise, it falls back to `ln1p(exp(x))`.
///
/// The cutoff used here (`x > 20.0`) keeps the calculation in a
/// well-conditioned regime for `f64`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, ∞)`: solves for `t` in
/// `softplus(t) = x`, returning `t = ln(exp(x) - 1)`.
///
/// - For sufficiently large `x`, `ln(exp(x) - 1) ≈ x`.
/// - Otherwise, it uses `ln(expm1(x))`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Numerically stable logistic function `σ(x) = 1 / (1 + exp(-x))`.
///
/// Evaluates `exp` only on non-positive arguments so neither tail overflows.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Map a bounded coordinate `x ∈ [lb, ub]` into unconstrained space.
///
/// Values outside the box are clamped first; values on a finite edge are
/// moved inside by [`LOGIT_EPS`]. A degenerate box (`lb == ub`) maps to `0`.
pub fn to_unconstrained(x: f64, lb: f64, ub: f64) -> f64 {
    match (lb.is_finite(), ub.is_finite()) {
        (true, true) => {
            let width = ub - lb;
            if width <= 0.0 {
                return 0.0;
            }
            let u = ((x - lb) / width).clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
            (u / (1.0 - u)).ln()
        }
        (true, false) => safe_softplus_inv((x - lb).max(LOGIT_EPS * lb.abs().max(1.0))),
        (false, true) => safe_softplus_inv((ub - x).max(LOGIT_EPS * ub.abs().max(1.0))),
        (false, false) => x,
    }
}

/// Inverse of [`to_unconstrained`]: map `z ∈ ℝ` back into `[lb, ub]`.
pub fn to_constrained(z: f64, lb: f64, ub: f64) -> f64 {
    match (lb.is_finite(), ub.is_finite()) {
        (true, true) => lb + (ub - lb) * safe_logistic(z),
        (true, false) => lb + safe_softplus(z),
        (false, true) => ub - safe_softplus(z),
        (false, false) => z,
    }
}

/// Derivative `dx/dz` of [`to_constrained`] at `z`, used to chain analytic
/// gradients into unconstrained space.
pub fn constrained_deriv(z: f64, lb: f64, ub: f64) -> f64 {
    match (lb.is_finite(), ub.is_finite()) {
        (true, true) => {
            let s = safe_logistic(z);
            (ub - lb) * s * (1.0 - s)
        }
        (true, false) => safe_logistic(z),
        (false, true) => -safe_logistic(z),
        (false, false) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement of the stable transforms with naïve formulas on safe inputs.
    // - Round trips of the box transform for every bound configuration.
    // - The box-transform derivative against a central difference.
    // -------------------------------------------------------------------------

    #[test]
    fn softplus_and_inverse_agree_with_naive_formulas() {
        for &x in &[-5.0_f64, -0.5, 0.0, 0.7, 3.0, 15.0] {
            let naive = (1.0 + x.exp()).ln();
            assert!((safe_softplus(x) - naive).abs() < 1e-12);
            assert!((safe_softplus_inv(safe_softplus(x)) - x).abs() < 1e-9);
        }
    }

    #[test]
    fn logistic_is_symmetric_and_bounded() {
        for &x in &[-800.0_f64, -3.0, 0.0, 2.5, 800.0] {
            let s = safe_logistic(x);
            assert!((0.0..=1.0).contains(&s));
            assert!((s + safe_logistic(-x) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Every bound configuration must round-trip interior points.
    //
    // Given
    // -----
    // - Boxes `[−2, 5]`, `[1, ∞)`, `(−∞, 4]`, `(−∞, ∞)` and interior points.
    //
    // Expect
    // ------
    // - `to_constrained(to_unconstrained(x)) ≈ x`.
    fn box_transform_round_trips_interior_points() {
        let cases = [
            (-2.0, 5.0, 0.3),
            (1.0, f64::INFINITY, 7.5),
            (f64::NEG_INFINITY, 4.0, -12.0),
            (f64::NEG_INFINITY, f64::INFINITY, 42.0),
        ];
        for &(lb, ub, x) in &cases {
            let z = to_unconstrained(x, lb, ub);
            let back = to_constrained(z, lb, ub);
            assert!((back - x).abs() < 1e-9, "[{lb}, {ub}] x = {x} came back as {back}");
        }
    }

    #[test]
    fn box_transform_keeps_edge_points_finite() {
        let z = to_unconstrained(5.0, -2.0, 5.0);
        assert!(z.is_finite());
        assert!((to_constrained(z, -2.0, 5.0) - 5.0).abs() < 1e-8);
    }

    #[test]
    fn constrained_deriv_matches_central_difference() {
        let h = 1e-6;
        for &(lb, ub) in &[(-1.0, 3.0), (0.5, f64::INFINITY), (f64::NEG_INFINITY, 2.0)] {
            let z = 0.4;
            let fd = (to_constrained(z + h, lb, ub) - to_constrained(z - h, lb, ub)) / (2.0 * h);
            assert!((constrained_deriv(z, lb, ub) - fd).abs() < 1e-6);
        }
    }
}
