//! Assembled profiles and the container they are stored in.
//!
//! A [`ProfileSeries`] is a finished 1-D profile: sorted unique points, a
//! monotone cubic interpolant and a [`ConfidenceInterval`]. A
//! [`ProfileSurface`] is a finished 2-D profile: the grown grid cropped to
//! its last layer, a bilinear interpolant and a [`ConfidenceRegion`].
//!
//! [`ProfileResults`] maps parameter indices (or pairs) to profiles and keeps
//! per-parameter failures beside them. Drivers write into it through a
//! [`ResultSink`], which serializes inserts from parallel workers.
use std::collections::BTreeMap;
use std::sync::Mutex;

use ndarray::Array2;

use crate::{
    optimization::loglik_optimizer::Theta,
    profile::{
        bivariate::GridNode,
        contour::{Polyline, contour_lines, point_in_polygon},
        errors::{ProfileError, ProfileResult},
        interpolation::{GriddedBilinear, MonotoneCubic},
        options::{ConfidenceLevel, IntervalMethod},
        problem::ParamNames,
        ranges::{ProfileGrid, SquareArena},
        roots::find_root,
        univariate::ProfilePoint,
    },
};

/// Relative tolerance for interval roots, scaled by the series span.
const ROOT_REL_TOL: f64 = 1e-10;

/// Confidence interval for one parameter.
///
/// Bounds are `NaN` when no evaluated point reached the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
    /// Method that produced the bounds; `Extrema` after a root-finding fallback.
    pub method: IntervalMethod,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn length(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_nan() || self.upper.is_nan()
    }
}

/// Finished univariate profile of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSeries {
    parameter_values: Vec<f64>,
    profile_values: Vec<f64>,
    nuisance: Vec<Theta>,
    converged: Vec<bool>,
    optimum: f64,
    threshold: f64,
    interpolant: MonotoneCubic,
    interval: ConfidenceInterval,
}

impl ProfileSeries {
    /// Sort and de-duplicate `points`, fit the interpolant and extract the
    /// interval.
    ///
    /// Points sharing a parameter value keep the first occurrence.
    ///
    /// # Errors
    /// [`ProfileError::Interpolation`] if fewer than two distinct finite
    /// points remain.
    pub fn from_points(
        mut points: Vec<ProfilePoint>, optimum: f64, threshold: f64, confidence: ConfidenceLevel,
        method: IntervalMethod,
    ) -> ProfileResult<Self> {
        points.sort_by(|a, b| a.value.total_cmp(&b.value));
        points.dedup_by(|later, earlier| later.value == earlier.value);

        let parameter_values: Vec<f64> = points.iter().map(|p| p.value).collect();
        let profile_values: Vec<f64> = points.iter().map(|p| p.profile).collect();
        let interpolant = MonotoneCubic::fit(&parameter_values, &profile_values)?;

        let extrema = extrema_interval(&parameter_values, &profile_values, threshold);
        let (lower, upper, method) = match method {
            IntervalMethod::Extrema => (extrema.0, extrema.1, IntervalMethod::Extrema),
            IntervalMethod::SplineRoot => {
                match spline_root_interval(&interpolant, &parameter_values, optimum, threshold) {
                    Ok((lower, upper)) => (lower, upper, IntervalMethod::SplineRoot),
                    Err(err) => {
                        log::warn!(
                            "spline-root interval failed around {optimum}: {err}; using extrema"
                        );
                        (extrema.0, extrema.1, IntervalMethod::Extrema)
                    }
                }
            }
        };

        let (nuisance, converged) = points.into_iter().map(|p| (p.nuisance, p.converged)).unzip();
        Ok(Self {
            parameter_values,
            profile_values,
            nuisance,
            converged,
            optimum,
            threshold,
            interpolant,
            interval: ConfidenceInterval { lower, upper, level: confidence.level(), method },
        })
    }

    pub fn parameter_values(&self) -> &[f64] {
        &self.parameter_values
    }

    pub fn profile_values(&self) -> &[f64] {
        &self.profile_values
    }

    /// Solved nuisance vectors, aligned with [`Self::parameter_values`].
    pub fn nuisance(&self) -> &[Theta] {
        &self.nuisance
    }

    pub fn converged(&self) -> &[bool] {
        &self.converged
    }

    pub fn optimum(&self) -> f64 {
        self.optimum
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn interval(&self) -> &ConfidenceInterval {
        &self.interval
    }

    pub fn len(&self) -> usize {
        self.parameter_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameter_values.is_empty()
    }

    /// Interpolated profile value at `value` (linear beyond the end points).
    pub fn eval(&self, value: f64) -> f64 {
        self.interpolant.eval(value)
    }

    /// Copy of the recorded points, in ascending parameter order.
    pub fn points(&self) -> Vec<ProfilePoint> {
        (0..self.len())
            .map(|k| ProfilePoint {
                value: self.parameter_values[k],
                profile: self.profile_values[k],
                nuisance: self.nuisance[k].clone(),
                converged: self.converged[k],
            })
            .collect()
    }
}

fn extrema_interval(values: &[f64], profile: &[f64], threshold: f64) -> (f64, f64) {
    let inside = values.iter().zip(profile).filter(|&(_, &p)| p >= threshold).map(|(&v, _)| v);
    inside.fold((f64::NAN, f64::NAN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

fn spline_root_interval(
    interpolant: &MonotoneCubic, values: &[f64], optimum: f64, threshold: f64,
) -> ProfileResult<(f64, f64)> {
    let (first, last) = (values[0], values[values.len() - 1]);
    let tol = ROOT_REL_TOL * (last - first).max(1.0);
    let excess = |x: f64| interpolant.eval(x) - threshold;
    // A side with no width has the optimum on its bound.
    let lower = if first < optimum { find_root(&excess, first, optimum, tol)? } else { first };
    let upper = if optimum < last { find_root(&excess, optimum, last, tol)? } else { last };
    Ok((lower, upper))
}

/// Joint confidence region for a parameter pair, as a polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceRegion {
    /// Polygon vertices in order, without a repeated closing vertex. Empty
    /// when no contour could be traced.
    pub boundary: Vec<(f64, f64)>,
    pub level: f64,
}

impl ConfidenceRegion {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        point_in_polygon(&self.boundary, x, y)
    }

    pub fn is_empty(&self) -> bool {
        self.boundary.len() < 3
    }

    /// Enclosed area (shoelace formula).
    pub fn area(&self) -> f64 {
        let n = self.boundary.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|k| {
                let (x0, y0) = self.boundary[k];
                let (x1, y1) = self.boundary[(k + 1) % n];
                x0 * y1 - x1 * y0
            })
            .sum();
        0.5 * twice.abs()
    }
}

/// Finished bivariate profile of one parameter pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSurface {
    nodes: SquareArena<GridNode>,
    optimum: (f64, f64),
    threshold: f64,
    interpolant: GriddedBilinear,
    region: ConfidenceRegion,
}

impl ProfileSurface {
    /// Tabulate the grown grid and trace the region at `threshold`.
    ///
    /// Missing nodes read as `NaN` and count as outside the region.
    ///
    /// # Errors
    /// [`ProfileError::Interpolation`] if the grid holds a single layer.
    pub fn from_arena(
        nodes: SquareArena<GridNode>, grid: &ProfileGrid, optimum: (f64, f64), threshold: f64,
        confidence: ConfidenceLevel,
    ) -> ProfileResult<Self> {
        let radius = nodes.radius();
        let r = radius as isize;
        let xs = grid.axes[0].coordinates(radius);
        let ys = grid.axes[1].coordinates(radius);
        let side = nodes.side();
        let values = Array2::from_shape_fn((side, side), |(i, j)| {
            nodes.get((i as isize - r, j as isize - r)).map_or(f64::NAN, |n| n.profile)
        });

        let lines = contour_lines(&xs, &ys, &values, threshold);
        let boundary = select_boundary(lines, optimum);
        if boundary.is_empty() {
            log::warn!("no contour at {threshold} around {optimum:?}; region is empty");
        }
        let interpolant = GriddedBilinear::new(xs, ys, values)?;
        Ok(Self {
            nodes,
            optimum,
            threshold,
            interpolant,
            region: ConfidenceRegion { boundary, level: confidence.level() },
        })
    }

    /// Ascending coordinates of the first parameter.
    pub fn xs(&self) -> &[f64] {
        self.interpolant.xs()
    }

    pub fn ys(&self) -> &[f64] {
        self.interpolant.ys()
    }

    /// Profile values, `values[[i, j]]` at `(xs[i], ys[j])`.
    pub fn values(&self) -> &Array2<f64> {
        self.interpolant.values()
    }

    /// Solved node at a signed offset from the optimum cell.
    pub fn node(&self, offset: (isize, isize)) -> Option<&GridNode> {
        self.nodes.get(offset)
    }

    /// Number of layers grown around the optimum.
    pub fn layers(&self) -> usize {
        self.nodes.radius()
    }

    pub fn optimum(&self) -> (f64, f64) {
        self.optimum
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn region(&self) -> &ConfidenceRegion {
        &self.region
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.interpolant.eval(x, y)
    }
}

/// Closed contour around the optimum if any (longest if several), else the
/// longest line; the closing vertex is dropped.
fn select_boundary(lines: Vec<Polyline>, optimum: (f64, f64)) -> Vec<(f64, f64)> {
    let by_length = |a: &&Polyline, b: &&Polyline| a.length().total_cmp(&b.length());
    let around = lines
        .iter()
        .filter(|l| l.closed && point_in_polygon(&l.points, optimum.0, optimum.1))
        .max_by(by_length);
    let Some(line) = around.or_else(|| lines.iter().max_by(by_length)) else {
        return Vec::new();
    };
    let mut points = line.points.clone();
    if line.closed && points.len() > 1 {
        points.pop();
    }
    points
}

/// Profiles keyed by parameter index (or index pair), with per-key failures.
#[derive(Debug, Clone)]
pub struct ProfileResults<K: Ord, P> {
    profiles: BTreeMap<K, P>,
    failures: BTreeMap<K, ProfileError>,
    names: ParamNames,
}

pub type UnivariateResults = ProfileResults<usize, ProfileSeries>;
pub type BivariateResults = ProfileResults<(usize, usize), ProfileSurface>;

impl<K: Ord, P> ProfileResults<K, P> {
    pub fn new(names: ParamNames) -> Self {
        Self { profiles: BTreeMap::new(), failures: BTreeMap::new(), names }
    }

    pub fn get(&self, key: &K) -> Option<&P> {
        self.profiles.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.profiles.contains_key(key)
    }

    /// Errors of the parameters (pairs) that could not be profiled.
    pub fn failures(&self) -> &BTreeMap<K, ProfileError> {
        &self.failures
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &P)> {
        self.profiles.iter()
    }

    pub fn names(&self) -> &ParamNames {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Store one outcome, replacing whatever was recorded under `key`.
    pub(crate) fn insert(&mut self, key: K, outcome: ProfileResult<P>) {
        match outcome {
            Ok(profile) => {
                self.failures.remove(&key);
                self.profiles.insert(key, profile);
            }
            Err(err) => {
                self.profiles.remove(&key);
                self.failures.insert(key, err);
            }
        }
    }
}

impl ProfileResults<usize, ProfileSeries> {
    pub fn get_by_name(&self, name: &str) -> ProfileResult<Option<&ProfileSeries>> {
        Ok(self.profiles.get(&self.names.index_of(name)?))
    }
}

impl ProfileResults<(usize, usize), ProfileSurface> {
    pub fn get_by_names(
        &self, first: &str, second: &str,
    ) -> ProfileResult<Option<&ProfileSurface>> {
        let key = (self.names.index_of(first)?, self.names.index_of(second)?);
        Ok(self.profiles.get(&key))
    }
}

/// Shared write access to a [`ProfileResults`] for the duration of one call.
///
/// The lock is held only while a finished profile is inserted.
pub struct ResultSink<'r, K: Ord, P> {
    inner: Mutex<&'r mut ProfileResults<K, P>>,
}

impl<'r, K: Ord, P> ResultSink<'r, K, P> {
    pub fn new(results: &'r mut ProfileResults<K, P>) -> Self {
        Self { inner: Mutex::new(results) }
    }

    pub fn insert(&self, key: K, outcome: ProfileResult<P>) {
        // Each insert is a single map update, so a poisoned lock is still consistent.
        let mut results = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        results.insert(key, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ranges::GridAxis;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sorting and de-duplication of assembled series.
    // - Spline-root and extrema intervals, including the NaN interval.
    // - Region selection around the optimum and the surface accessors.
    // - Insert/replace semantics of the results container.
    // -------------------------------------------------------------------------

    fn quadratic_points(values: &[f64]) -> Vec<ProfilePoint> {
        values
            .iter()
            .map(|&v| ProfilePoint {
                value: v,
                profile: -0.5 * (v - 3.0) * (v - 3.0),
                nuisance: array![v],
                converged: true,
            })
            .collect()
    }

    fn level() -> ConfidenceLevel {
        ConfidenceLevel::default()
    }

    #[test]
    fn series_is_sorted_and_keeps_first_duplicate() {
        let mut points = quadratic_points(&[3.0, 4.0, 2.0, 5.0]);
        let mut dup = points[1].clone();
        dup.nuisance = array![-1.0];
        points.push(dup);
        let series =
            ProfileSeries::from_points(points, 3.0, -1.92, level(), IntervalMethod::Extrema)
                .expect("series");
        assert_eq!(series.parameter_values(), &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(series.nuisance()[2], array![4.0]);
        assert_eq!(series.points().len(), 4);
    }

    #[test]
    // Purpose
    // -------
    // Spline roots land near the analytic interval and straddle the optimum.
    //
    // Given
    // -----
    // - `ℓ_p = −(θ − 3)²/2` sampled every 0.25 on [0, 6], threshold −1.9207.
    //
    // Expect
    // ------
    // - Interval ≈ `3 ± 1.96` within 1 %, produced by the spline-root method.
    fn spline_root_interval_matches_quadratic() {
        let values: Vec<f64> = (0..=24).map(|k| k as f64 * 0.25).collect();
        let threshold = level().threshold(1, 0.0, true).expect("threshold");
        let series = ProfileSeries::from_points(
            quadratic_points(&values),
            3.0,
            threshold,
            level(),
            IntervalMethod::SplineRoot,
        )
        .expect("series");
        let ci = series.interval();
        assert_eq!(ci.method, IntervalMethod::SplineRoot);
        assert!((ci.lower - 1.04).abs() < 0.0104, "{ci:?}");
        assert!((ci.upper - 4.96).abs() < 0.0496, "{ci:?}");
        assert!(ci.contains(3.0) && !ci.contains(0.5));
        assert!((series.eval(3.0)).abs() < 1e-12);
    }

    #[test]
    fn optimum_on_bound_keeps_spline_root_on_the_other_side() {
        // The series ends at the optimum; only the lower root is searched.
        let values: Vec<f64> = (0..=12).map(|k| k as f64 * 0.25).collect();
        let threshold = level().threshold(1, 0.0, true).expect("threshold");
        let series = ProfileSeries::from_points(
            quadratic_points(&values),
            3.0,
            threshold,
            level(),
            IntervalMethod::SplineRoot,
        )
        .expect("series");
        let ci = series.interval();
        assert_eq!(ci.method, IntervalMethod::SplineRoot);
        assert!((ci.lower - 1.04).abs() < 0.0104, "{ci:?}");
        assert_eq!(ci.upper, 3.0);
    }

    #[test]
    fn missing_crossing_falls_back_to_extrema() {
        // The profile never drops below the threshold on the left.
        let series = ProfileSeries::from_points(
            quadratic_points(&[2.5, 3.0, 4.0, 5.0, 6.0]),
            3.0,
            -1.0,
            level(),
            IntervalMethod::SplineRoot,
        )
        .expect("series");
        let ci = series.interval();
        assert_eq!(ci.method, IntervalMethod::Extrema);
        assert_eq!((ci.lower, ci.upper), (2.5, 4.0));
    }

    #[test]
    fn extrema_without_points_above_threshold_is_nan() {
        let series = ProfileSeries::from_points(
            quadratic_points(&[0.0, 6.0]),
            3.0,
            -1.0,
            level(),
            IntervalMethod::Extrema,
        )
        .expect("series");
        assert!(series.interval().is_empty());
        assert!(!series.interval().contains(3.0));
    }

    #[test]
    fn single_point_series_fails_interpolation() {
        let err = ProfileSeries::from_points(
            quadratic_points(&[3.0, 3.0]),
            3.0,
            -1.0,
            level(),
            IntervalMethod::Extrema,
        )
        .unwrap_err();
        assert!(matches!(err, ProfileError::Interpolation { points: 1, .. }));
    }

    #[test]
    // Purpose
    // -------
    // A surface built from a radial bowl yields a region around the optimum
    // close to the analytic circle.
    //
    // Given
    // -----
    // - `ℓ_p = −(x² + y²)/2` on a 21×21 grid over [−5, 5]², level −2.
    //
    // Expect
    // ------
    // - Open polygon (no repeated vertex), area ≈ 4π, optimum inside.
    fn surface_region_encloses_optimum() {
        let axis = GridAxis::new(0.0, -5.0, 5.0, 10);
        let grid = ProfileGrid::new(axis, axis);
        let mut arena = SquareArena::new(10);
        for i in -10..=10isize {
            for j in -10..=10isize {
                let (x, y) = grid.point((i, j));
                arena.set(
                    (i, j),
                    GridNode {
                        profile: -0.5 * (x * x + y * y),
                        nuisance: array![x],
                        converged: true,
                    },
                );
            }
        }
        arena.mark_filled(10);
        let surface = ProfileSurface::from_arena(arena, &grid, (0.0, 0.0), -2.0, level())
            .expect("surface");
        let region = surface.region();
        assert_ne!(region.boundary.first(), region.boundary.last());
        assert!(region.contains(0.0, 0.0));
        assert!(!region.contains(2.5, 0.0));
        let circle = std::f64::consts::PI * 4.0;
        assert!((region.area() - circle).abs() / circle < 0.05, "{}", region.area());
        assert_eq!(surface.layers(), 10);
        assert_eq!(surface.xs().len(), 21);
        assert_eq!(surface.node((-10, 0)).map(|n| n.nuisance[0]), Some(-5.0));
        assert!((surface.eval(1.0, 1.0) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn results_insert_replaces_profile_and_failure() {
        let names = ParamNames::new(["a", "b"]).expect("names");
        let mut results: ProfileResults<usize, f64> = ProfileResults::new(names);
        {
            let sink = ResultSink::new(&mut results);
            sink.insert(0, Ok(1.0));
            sink.insert(1, Err(ProfileError::NothingToProfile));
        }
        assert_eq!(results.get(&0), Some(&1.0));
        assert!(results.failures().contains_key(&1));

        results.insert(1, Ok(2.0));
        results.insert(0, Err(ProfileError::NothingToProfile));
        assert_eq!(results.get(&1), Some(&2.0));
        assert!(results.failures().contains_key(&0) && !results.failures().contains_key(&1));
        assert_eq!(results.len(), 1);
    }
}
