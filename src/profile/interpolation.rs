//! Interpolants used to turn discrete profiles into callable functions.
//!
//! - [`MonotoneCubic`]: Fritsch–Carlson shape-preserving cubic Hermite
//!   interpolant. Used for 1-D profile curves and interval roots.
//! - [`CubicSpline`]: natural cubic spline. Used to seed nuisance estimates
//!   for refined points.
//! - [`GriddedBilinear`]: bilinear interpolation on a rectilinear grid. Used
//!   for 2-D profile surfaces.
//!
//! All three extrapolate linearly beyond the data range.
use crate::profile::errors::{ProfileError, ProfileResult};
use ndarray::Array2;

fn check_nodes(xs: &[f64], ys: &[f64]) -> ProfileResult<()> {
    if xs.len() != ys.len() {
        return Err(ProfileError::DimensionMismatch {
            what: "interpolation nodes",
            expected: xs.len(),
            found: ys.len(),
        });
    }
    if xs.len() < 2 {
        return Err(ProfileError::Interpolation {
            reason: "at least two points are required",
            points: xs.len(),
        });
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return Err(ProfileError::Interpolation {
            reason: "points must be finite",
            points: xs.len(),
        });
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(ProfileError::Interpolation {
            reason: "abscissae must be strictly increasing",
            points: xs.len(),
        });
    }
    Ok(())
}

/// Index `k` of the interval `[xs[k], xs[k + 1]]` used for `x`.
///
/// Points left of the grid use the first interval and points right of it the
/// last, which makes every interpolant here extrapolate from its end pieces.
fn interval_index(xs: &[f64], x: f64) -> usize {
    let last = xs.len() - 2;
    match xs.partition_point(|&v| v <= x) {
        0 => 0,
        p => (p - 1).min(last),
    }
}

/// Shape-preserving piecewise cubic Hermite interpolant (Fritsch–Carlson).
#[derive(Debug, Clone, PartialEq)]
pub struct MonotoneCubic {
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
}

impl MonotoneCubic {
    /// Fit through `(xs[k], ys[k])`; `xs` must be strictly increasing.
    ///
    /// # Errors
    /// [`ProfileError::Interpolation`] for fewer than two, non-finite or
    /// unsorted points; [`ProfileError::DimensionMismatch`] for unequal lengths.
    pub fn fit(xs: &[f64], ys: &[f64]) -> ProfileResult<Self> {
        check_nodes(xs, ys)?;
        let n = xs.len();
        let secants: Vec<f64> =
            (0..n - 1).map(|k| (ys[k + 1] - ys[k]) / (xs[k + 1] - xs[k])).collect();

        let mut slopes = vec![0.0; n];
        slopes[0] = secants[0];
        slopes[n - 1] = secants[n - 2];
        for k in 1..n - 1 {
            slopes[k] = if secants[k - 1] * secants[k] <= 0.0 {
                0.0
            } else {
                0.5 * (secants[k - 1] + secants[k])
            };
        }

        // Fritsch–Carlson limiter: keep (α, β) inside the circle of radius 3.
        for k in 0..n - 1 {
            if secants[k] == 0.0 {
                slopes[k] = 0.0;
                slopes[k + 1] = 0.0;
                continue;
            }
            let alpha = slopes[k] / secants[k];
            let beta = slopes[k + 1] / secants[k];
            let radius = alpha.hypot(beta);
            if radius > 3.0 {
                let tau = 3.0 / radius;
                slopes[k] = tau * alpha * secants[k];
                slopes[k + 1] = tau * beta * secants[k];
            }
        }

        Ok(Self { xs: xs.to_vec(), ys: ys.to_vec(), slopes })
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x < self.xs[0] {
            return self.ys[0] + self.slopes[0] * (x - self.xs[0]);
        }
        if x > self.xs[n - 1] {
            return self.ys[n - 1] + self.slopes[n - 1] * (x - self.xs[n - 1]);
        }
        let k = interval_index(&self.xs, x);
        let h = self.xs[k + 1] - self.xs[k];
        let t = (x - self.xs[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;
        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;
        h00 * self.ys[k]
            + h10 * h * self.slopes[k]
            + h01 * self.ys[k + 1]
            + h11 * h * self.slopes[k + 1]
    }
}

/// Natural cubic spline (zero second derivative at both ends).
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    second: Vec<f64>,
}

impl CubicSpline {
    /// Fit a natural spline; two points give the straight line through them.
    pub fn fit(xs: &[f64], ys: &[f64]) -> ProfileResult<Self> {
        check_nodes(xs, ys)?;
        let n = xs.len();
        let mut second = vec![0.0; n];
        if n > 2 {
            // Thomas algorithm on the interior second derivatives.
            let m = n - 2;
            let mut diag = vec![0.0; m];
            let mut rhs = vec![0.0; m];
            let mut upper = vec![0.0; m];
            for r in 0..m {
                let k = r + 1;
                let h0 = xs[k] - xs[k - 1];
                let h1 = xs[k + 1] - xs[k];
                diag[r] = 2.0 * (h0 + h1);
                upper[r] = h1;
                rhs[r] = 6.0 * ((ys[k + 1] - ys[k]) / h1 - (ys[k] - ys[k - 1]) / h0);
                if r > 0 {
                    let lower = h0;
                    let w = lower / diag[r - 1];
                    diag[r] -= w * upper[r - 1];
                    rhs[r] -= w * rhs[r - 1];
                }
            }
            second[m] = rhs[m - 1] / diag[m - 1];
            for r in (0..m - 1).rev() {
                second[r + 1] = (rhs[r] - upper[r] * second[r + 2]) / diag[r];
            }
        }
        Ok(Self { xs: xs.to_vec(), ys: ys.to_vec(), second })
    }

    fn end_slope(&self, k: usize, at_right: bool) -> f64 {
        let h = self.xs[k + 1] - self.xs[k];
        let secant = (self.ys[k + 1] - self.ys[k]) / h;
        if at_right {
            secant + h * (self.second[k] + 2.0 * self.second[k + 1]) / 6.0
        } else {
            secant - h * (2.0 * self.second[k] + self.second[k + 1]) / 6.0
        }
    }

    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if x < self.xs[0] {
            return self.ys[0] + self.end_slope(0, false) * (x - self.xs[0]);
        }
        if x > self.xs[n - 1] {
            return self.ys[n - 1] + self.end_slope(n - 2, true) * (x - self.xs[n - 1]);
        }
        let k = interval_index(&self.xs, x);
        let h = self.xs[k + 1] - self.xs[k];
        let a = (self.xs[k + 1] - x) / h;
        let b = (x - self.xs[k]) / h;
        a * self.ys[k]
            + b * self.ys[k + 1]
            + ((a * a * a - a) * self.second[k] + (b * b * b - b) * self.second[k + 1]) * h * h
                / 6.0
    }
}

/// Locate `x` on a non-decreasing axis for bilinear weights.
///
/// Returns the lower node index and the (possibly extrapolating) fraction
/// `t` along that cell. A zero-width cell yields `t = 0`.
pub(crate) fn locate(axis: &[f64], x: f64) -> (usize, f64) {
    if axis.len() < 2 {
        return (0, 0.0);
    }
    let k = interval_index(axis, x);
    let width = axis[k + 1] - axis[k];
    let t = if width > 0.0 { (x - axis[k]) / width } else { 0.0 };
    (k, t)
}

/// Bilinear interpolant over `values[[i, j]]` at `(xs[i], ys[j])`.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedBilinear {
    xs: Vec<f64>,
    ys: Vec<f64>,
    values: Array2<f64>,
}

impl GriddedBilinear {
    /// # Errors
    /// [`ProfileError::DimensionMismatch`] if `values` is not
    /// `xs.len() × ys.len()`; [`ProfileError::Interpolation`] for unsorted or
    /// single-node axes.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, values: Array2<f64>) -> ProfileResult<Self> {
        let (nx, ny) = values.dim();
        if nx != xs.len() {
            return Err(ProfileError::DimensionMismatch {
                what: "grid rows",
                expected: xs.len(),
                found: nx,
            });
        }
        if ny != ys.len() {
            return Err(ProfileError::DimensionMismatch {
                what: "grid columns",
                expected: ys.len(),
                found: ny,
            });
        }
        for axis in [&xs, &ys] {
            if axis.len() < 2 || axis.windows(2).any(|w| w[1] < w[0]) {
                return Err(ProfileError::Interpolation {
                    reason: "grid axes need at least two non-decreasing nodes",
                    points: nx * ny,
                });
            }
        }
        Ok(Self { xs, ys, values })
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        let (i, t) = locate(&self.xs, x);
        let (j, u) = locate(&self.ys, y);
        let v = &self.values;
        (1.0 - t) * (1.0 - u) * v[[i, j]]
            + t * (1.0 - u) * v[[i + 1, j]]
            + (1.0 - t) * u * v[[i, j + 1]]
            + t * u * v[[i + 1, j + 1]]
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}
