//! Univariate profiles: walk from the optimum towards each bound until the
//! profile drops below the threshold.
//!
//! For every requested parameter a [`ProblemTemplate`] fixes that parameter.
//! Each direction starts from the optimum, recorded exactly, and steps
//! through its candidate values, seeding every restricted solve with the
//! configured [`NextEstimate1D`](crate::profile::strategy::NextEstimate1D).
//! A direction that reaches the threshold in fewer than `min_steps` points is
//! refilled according to [`RefillPolicy`]. Both directions are then merged
//! into a [`ProfileSeries`].
//!
//! Entry points:
//! - [`profile_univariate`]: profile a set of parameters into fresh results.
//! - [`replace_profile`]: recompute some entries of existing results.
//! - [`refine_profile`]: add interior points to existing series.
use rayon::prelude::*;

use crate::{
    optimization::loglik_optimizer::{LogLikelihood, Theta},
    profile::{
        errors::{ProfileError, ProfileResult},
        interpolation::CubicSpline,
        options::{Execution, RefillPolicy, UnivariateOptions},
        problem::{LikelihoodProblem, ModelOptimum},
        ranges::{ParamRange, linspace},
        restricted::{FixedIndices, ProblemTemplate, RestrictedProblem},
        results::{ProfileResults, ProfileSeries, ResultSink, UnivariateResults},
    },
};

/// One evaluated point of a univariate profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePoint {
    /// Value of the profiled parameter.
    pub value: f64,
    /// Restricted maximum, shifted when profiles are normalised.
    pub profile: f64,
    pub nuisance: Theta,
    pub converged: bool,
}

/// Profile each parameter in `indices`.
///
/// Configuration is validated for every index before any optimizer call;
/// numerical failures of one parameter are stored in
/// [`ProfileResults::failures`] and do not stop the others.
///
/// # Errors
/// Configuration errors only (see [`ProfileError::is_configuration`]).
pub fn profile_univariate<F>(
    problem: &LikelihoodProblem<F>, optimum: &ModelOptimum, indices: &[usize],
    opts: &UnivariateOptions,
) -> ProfileResult<UnivariateResults>
where
    F: LogLikelihood + Sync,
    F::Data: Sync,
{
    let mut results = ProfileResults::new(problem.names().clone());
    replace_profile(&mut results, problem, optimum, indices, opts)?;
    Ok(results)
}

/// Like [`profile_univariate`], with parameters given by name.
pub fn profile_univariate_by_name<F>(
    problem: &LikelihoodProblem<F>, optimum: &ModelOptimum, names: &[&str],
    opts: &UnivariateOptions,
) -> ProfileResult<UnivariateResults>
where
    F: LogLikelihood + Sync,
    F::Data: Sync,
{
    let indices =
        names.iter().map(|n| problem.names().index_of(n)).collect::<ProfileResult<Vec<_>>>()?;
    profile_univariate(problem, optimum, &indices, opts)
}

/// Recompute the profiles of `indices` and splice them into `results`,
/// leaving every other entry untouched.
pub fn replace_profile<F>(
    results: &mut UnivariateResults, problem: &LikelihoodProblem<F>, optimum: &ModelOptimum,
    indices: &[usize], opts: &UnivariateOptions,
) -> ProfileResult<()>
where
    F: LogLikelihood + Sync,
    F::Data: Sync,
{
    validate(problem, optimum, indices, opts)?;
    let threshold = opts.threshold(optimum.max_loglik())?;
    let sink = ResultSink::new(results);
    let run = |&index: &usize| {
        let outcome = profile_parameter(problem, optimum, index, threshold, opts);
        log_outcome(problem, index, &outcome);
        sink.insert(index, outcome);
    };
    match opts.execution {
        Execution::Serial => indices.iter().for_each(run),
        Execution::Parallel => indices.par_iter().for_each(run),
    }
    Ok(())
}

/// Add interior points to the existing series of `indices` until each holds
/// at least `min_steps` points.
///
/// Previously recorded points are kept unchanged. New points are seeded from
/// a natural cubic spline through the recorded nuisance vectors and solved in
/// parallel when `opts.refill` is [`RefillPolicy::ParallelRefine`].
///
/// # Errors
/// [`ProfileError::MissingProfile`] if an index has no stored series, plus
/// the configuration errors of [`profile_univariate`].
pub fn refine_profile<F>(
    results: &mut UnivariateResults, problem: &LikelihoodProblem<F>, optimum: &ModelOptimum,
    indices: &[usize], min_steps: usize, opts: &UnivariateOptions,
) -> ProfileResult<()>
where
    F: LogLikelihood + Sync,
    F::Data: Sync,
{
    validate(problem, optimum, indices, opts)?;
    let existing = indices
        .iter()
        .map(|&index| {
            results.get(&index).map(|s| (index, s.points())).ok_or_else(|| {
                ProfileError::MissingProfile {
                    key: problem.names().name(index).unwrap_or_default().to_string(),
                }
            })
        })
        .collect::<ProfileResult<Vec<_>>>()?;
    let threshold = opts.threshold(optimum.max_loglik())?;
    let parallel = opts.refill == RefillPolicy::ParallelRefine;

    let sink = ResultSink::new(results);
    let run = |(index, points): (usize, Vec<ProfilePoint>)| {
        let outcome = ProblemTemplate::new(
            problem,
            optimum,
            FixedIndices::Single(index),
            opts.shift(optimum.max_loglik()),
            &opts.mle,
        )
        .and_then(|template| refine_points(&template, points, min_steps, parallel))
        .and_then(|points| {
            let theta = optimum.theta_hat()[index];
            ProfileSeries::from_points(points, theta, threshold, opts.confidence, opts.interval)
        });
        log_outcome(problem, index, &outcome);
        sink.insert(index, outcome);
    };
    match opts.execution {
        Execution::Serial => existing.into_iter().for_each(run),
        Execution::Parallel => existing.into_par_iter().for_each(run),
    }
    Ok(())
}

fn validate<F: LogLikelihood>(
    problem: &LikelihoodProblem<F>, optimum: &ModelOptimum, indices: &[usize],
    opts: &UnivariateOptions,
) -> ProfileResult<()> {
    if indices.is_empty() {
        return Err(ProfileError::NothingToProfile);
    }
    problem.check_optimum(optimum)?;
    for (k, &index) in indices.iter().enumerate() {
        problem.check_profilable(index)?;
        if indices[..k].contains(&index) {
            return Err(ProfileError::DuplicateIndices { index });
        }
    }
    opts.resolution.validate(problem.n_params(), indices)
}

fn log_outcome<F: LogLikelihood, T>(
    problem: &LikelihoodProblem<F>, index: usize, outcome: &ProfileResult<T>,
) {
    let name = problem.names().name(index).unwrap_or_default();
    match outcome {
        Ok(_) => log::info!("profiled {name}"),
        Err(err) => log::warn!("profiling {name} failed: {err}"),
    }
}

fn profile_parameter<F>(
    problem: &LikelihoodProblem<F>, optimum: &ModelOptimum, index: usize, threshold: f64,
    opts: &UnivariateOptions,
) -> ProfileResult<ProfileSeries>
where
    F: LogLikelihood + Sync,
    F::Data: Sync,
{
    let shift = opts.shift(optimum.max_loglik());
    let template =
        ProblemTemplate::new(problem, optimum, FixedIndices::Single(index), shift, &opts.mle)?;
    let theta = optimum.theta_hat()[index];
    let (lower, upper) = (problem.bounds().lower()[index], problem.bounds().upper()[index]);
    let range = ParamRange::new(theta, lower, upper, opts.resolution.for_param(index));
    let start = ProfilePoint {
        value: theta,
        profile: optimum.max_loglik() - shift,
        nuisance: template.optimum_nuisance(),
        converged: true,
    };

    let direction =
        |candidates: &[f64]| profile_direction(&template, candidates, &start, threshold, opts);
    let (left, right) = match opts.execution {
        Execution::Serial => (direction(range.left.as_slice()), direction(range.right.as_slice())),
        Execution::Parallel => rayon::join(
            || direction(range.left.as_slice()),
            || direction(range.right.as_slice()),
        ),
    };
    let mut points = left?;
    points.extend(right?);
    ProfileSeries::from_points(points, theta, threshold, opts.confidence, opts.interval)
}

fn profile_direction<F>(
    template: &ProblemTemplate<'_, F>, candidates: &[f64], start: &ProfilePoint, threshold: f64,
    opts: &UnivariateOptions,
) -> ProfileResult<Vec<ProfilePoint>>
where
    F: LogLikelihood + Sync,
    F::Data: Sync,
{
    let points = walk(template, candidates, start, Some(threshold), opts)?;
    if points.len() >= opts.min_steps {
        return Ok(points);
    }
    let last = points.last().map_or(start.value, |p| p.value);
    if last == start.value {
        // The optimum sits on this bound; there is nothing to refill.
        return Ok(points);
    }
    log::debug!(
        "{} points between {} and {last}, below {} minimum; refilling ({:?})",
        points.len(),
        start.value,
        opts.min_steps,
        opts.refill
    );
    match opts.refill {
        RefillPolicy::Replace => {
            let candidates = linspace(start.value, last, opts.min_steps);
            walk(template, &candidates, start, None, opts)
        }
        RefillPolicy::Refine => refine_points(template, points, opts.min_steps, false),
        RefillPolicy::ParallelRefine => refine_points(template, points, opts.min_steps, true),
    }
}

/// Step through `candidates[1..]` with one restricted problem, stopping after
/// the first point at or below `threshold`.
fn walk<F: LogLikelihood>(
    template: &ProblemTemplate<'_, F>, candidates: &[f64], start: &ProfilePoint,
    threshold: Option<f64>, opts: &UnivariateOptions,
) -> ProfileResult<Vec<ProfilePoint>> {
    let mut restricted = template.instantiate();
    let mut points = vec![start.clone()];
    for &value in candidates.iter().skip(1) {
        if let Some(guess) = opts.strategy.next(&points, value, template.free_bounds()) {
            restricted.set_guess(guess);
        }
        let point = solve_at(&mut restricted, value)?;
        let crossed = threshold.is_some_and(|t| point.profile <= t);
        points.push(point);
        if crossed {
            break;
        }
    }
    Ok(points)
}

fn solve_at<F: LogLikelihood>(
    restricted: &mut RestrictedProblem<'_, F>, value: f64,
) -> ProfileResult<ProfilePoint> {
    restricted.fix(&[value]);
    let solution = restricted.solve()?;
    Ok(ProfilePoint {
        value,
        profile: solution.profile,
        nuisance: solution.nuisance,
        converged: solution.converged,
    })
}

/// Insert interior points until at least `min_steps` distinct values exist.
///
/// With fewer than two distinct values there is no interval to refine and
/// the points are returned as they are.
fn refine_points<F>(
    template: &ProblemTemplate<'_, F>, mut points: Vec<ProfilePoint>, min_steps: usize,
    parallel: bool,
) -> ProfileResult<Vec<ProfilePoint>>
where
    F: LogLikelihood + Sync,
    F::Data: Sync,
{
    points.sort_by(|a, b| a.value.total_cmp(&b.value));
    points.dedup_by(|later, earlier| later.value == earlier.value);
    if points.len() >= min_steps {
        return Ok(points);
    }
    if points.len() < 2 {
        log::warn!("cannot refine a profile with {} distinct point(s)", points.len());
        return Ok(points);
    }

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let targets = refinement_targets(&values, min_steps);
    let seeds = NuisanceSeeds::fit(&points)?;
    let seeded: Vec<(f64, Theta)> =
        targets.into_iter().map(|v| (v, seeds.at(v, template))).collect();

    let fresh: Vec<ProfilePoint> = if parallel {
        seeded
            .into_par_iter()
            .map_init(
                || template.instantiate(),
                |restricted, (value, guess)| {
                    restricted.set_guess(guess);
                    solve_at(restricted, value)
                },
            )
            .collect::<ProfileResult<_>>()?
    } else {
        let mut restricted = template.instantiate();
        seeded
            .into_iter()
            .map(|(value, guess)| {
                restricted.set_guess(guess);
                solve_at(&mut restricted, value)
            })
            .collect::<ProfileResult<_>>()?
    };
    points.extend(fresh);
    points.sort_by(|a, b| a.value.total_cmp(&b.value));
    Ok(points)
}

/// Interior values of an even grid of `min_steps` points spanning the sorted
/// `values`, skipping values already present.
///
/// The grid has `min_steps` distinct values, so the union always reaches
/// `min_steps` points.
fn refinement_targets(values: &[f64], min_steps: usize) -> Vec<f64> {
    let (first, last) = (values[0], values[values.len() - 1]);
    let eps = 1e-12 * (last - first).abs().max(1.0);
    linspace(first, last, min_steps)
        .into_iter()
        .filter(|&v| values.iter().all(|&u| (u - v).abs() > eps))
        .collect()
}

/// Natural cubic splines of each nuisance component against the profiled value.
struct NuisanceSeeds<'p> {
    points: &'p [ProfilePoint],
    splines: Vec<CubicSpline>,
}

impl<'p> NuisanceSeeds<'p> {
    fn fit(points: &'p [ProfilePoint]) -> ProfileResult<Self> {
        let xs: Vec<f64> = points.iter().map(|p| p.value).collect();
        let n_free = points.first().map_or(0, |p| p.nuisance.len());
        let splines = (0..n_free)
            .map(|k| {
                let ys: Vec<f64> = points.iter().map(|p| p.nuisance[k]).collect();
                CubicSpline::fit(&xs, &ys)
            })
            .collect::<ProfileResult<_>>()?;
        Ok(Self { points, splines })
    }

    /// Spline guess at `value`; the nearest recorded nuisance if the guess
    /// leaves the free bounds.
    fn at<F: LogLikelihood>(&self, value: f64, template: &ProblemTemplate<'_, F>) -> Theta {
        let guess: Theta = self.splines.iter().map(|s| s.eval(value)).collect();
        if guess.iter().all(|v| v.is_finite()) && template.free_bounds().contains(&guess) {
            return guess;
        }
        self.points
            .iter()
            .min_by(|a, b| (a.value - value).abs().total_cmp(&(b.value - value).abs()))
            .map_or(guess, |p| p.nuisance.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::OptResult,
        loglik_optimizer::{Bounds, Grad},
    };
    use crate::profile::options::{IntervalMethod, Resolution};
    use ndarray::array;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Walking each direction until the threshold is crossed.
    // - The three refill policies and their point-count guarantees, including
    //   replace on a range that never crosses the threshold.
    // - An optimum on a bound: no solves on that side, spline root kept on
    //   the other.
    // - Refinement targets on an even grid, skipping recorded values.
    // - Configuration errors raised before any solve.
    // -------------------------------------------------------------------------

    /// ℓ = −((θ₀ − 3)² + (θ₁ − θ₀)²)/2, so the profile of θ₀ is
    /// −(θ₀ − 3)²/2.
    struct Shifted;

    impl LogLikelihood for Shifted {
        type Data = ();
        fn value(&self, t: &Theta, _: &()) -> OptResult<f64> {
            Ok(-0.5 * ((t[0] - 3.0).powi(2) + (t[1] - t[0]).powi(2)))
        }
        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
        fn grad(&self, t: &Theta, _: &()) -> OptResult<Grad> {
            Ok(array![-(t[0] - 3.0) + (t[1] - t[0]), -(t[1] - t[0])])
        }
    }

    fn problem() -> LikelihoodProblem<Shifted> {
        let bounds = Bounds::new(array![-10.0, -20.0], array![10.0, 20.0]).expect("bounds");
        LikelihoodProblem::new(Shifted, (), bounds, array![0.0, 0.0])
            .expect("problem")
            .with_names(["mu", "nu"])
            .expect("names")
    }

    fn optimum() -> ModelOptimum {
        ModelOptimum::new(array![3.0, 3.0], 0.0).expect("optimum")
    }

    #[test]
    // Purpose
    // -------
    // The default run recovers the analytic interval of a quadratic profile
    // and keeps the series strictly increasing with the exact optimum.
    //
    // Given
    // -----
    // - `Shifted` on [−10, 10], resolution 50, default options.
    //
    // Expect
    // ------
    // - Interval ≈ (1.04, 4.96) within 1 %; profile 0 at θ̂ = 3.
    fn quadratic_profile_recovers_interval() {
        let opts = UnivariateOptions::default().with_resolution(Resolution::Uniform(50));
        let results = profile_univariate(&problem(), &optimum(), &[0], &opts).expect("config");
        let series = results.get(&0).expect("series for mu");
        assert!(series.parameter_values().windows(2).all(|w| w[0] < w[1]));
        let k = series.parameter_values().iter().position(|&v| v == 3.0).expect("optimum kept");
        assert_eq!(series.profile_values()[k], 0.0);
        let ci = series.interval();
        assert!((ci.lower - 1.04).abs() < 0.0104, "{ci:?}");
        assert!((ci.upper - 4.96).abs() < 0.0496, "{ci:?}");
        assert!(ci.lower < 3.0 && 3.0 < ci.upper);
        let by_name = results.get_by_name("mu").expect("known name").expect("profiled");
        assert_eq!(by_name, series);
    }

    #[test]
    // Purpose
    // -------
    // With a coarse range the threshold is crossed after two steps, so the
    // replace policy re-walks exactly `min_steps` evenly spaced points.
    //
    // Given
    // -----
    // - Resolution 5 (step 1.75 to the right), min_steps 6, replace.
    //
    // Expect
    // ------
    // - Right half is `linspace(3, 6.5, 6)`; left half likewise to −0.25.
    fn replace_rewalks_evenly_spaced_points() {
        let opts = UnivariateOptions::default()
            .with_resolution(Resolution::Uniform(5))
            .with_min_steps(6)
            .with_refill(RefillPolicy::Replace);
        let results = profile_univariate(&problem(), &optimum(), &[0], &opts).expect("config");
        let series = results.get(&0).expect("series");
        let right: Vec<f64> =
            series.parameter_values().iter().copied().filter(|&v| v >= 3.0).collect();
        let expected = linspace(3.0, 6.5, 6);
        assert_eq!(right.len(), 6);
        for (a, b) in right.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-12, "{right:?}");
        }
        let left = series.parameter_values().iter().filter(|&&v| v <= 3.0).count();
        assert_eq!(left, 6);
    }

    #[test]
    // Purpose
    // -------
    // When the threshold is never crossed, replace re-walks `min_steps` evenly
    // spaced points all the way to the bound.
    //
    // Given
    // -----
    // - `Shifted` with θ₀ ∈ [2.5, 3.5], resolution 3, min_steps 7, replace.
    //
    // Expect
    // ------
    // - Each half is exactly `linspace(3, bound, 7)`; the interval falls back
    //   to the extrema (2.5, 3.5).
    fn replace_on_exhausted_range_walks_to_the_bound() {
        let bounds = Bounds::new(array![2.5, -20.0], array![3.5, 20.0]).expect("bounds");
        let problem =
            LikelihoodProblem::new(Shifted, (), bounds, array![3.0, 0.0]).expect("problem");
        let opts = UnivariateOptions::default()
            .with_resolution(Resolution::Uniform(3))
            .with_min_steps(7)
            .with_refill(RefillPolicy::Replace);
        let results = profile_univariate(&problem, &optimum(), &[0], &opts).expect("config");
        let series = results.get(&0).expect("series");
        assert_eq!(series.len(), 13);

        let values = series.parameter_values();
        let (left, right) = (&values[..7], &values[6..]);
        let mut expected_left = linspace(3.0, 2.5, 7);
        expected_left.reverse();
        for (a, b) in left.iter().zip(&expected_left) {
            assert!((a - b).abs() < 1e-12, "{values:?}");
        }
        for (a, b) in right.iter().zip(&linspace(3.0, 3.5, 7)) {
            assert!((a - b).abs() < 1e-12, "{values:?}");
        }
        assert_eq!((values[0], values[12]), (2.5, 3.5));

        let ci = series.interval();
        assert_eq!(ci.method, IntervalMethod::Extrema);
        assert_eq!((ci.lower, ci.upper), (2.5, 3.5));
    }

    /// `Shifted` with an evaluation counter as its data.
    struct Counted;

    impl LogLikelihood for Counted {
        type Data = AtomicUsize;
        fn value(&self, t: &Theta, evals: &AtomicUsize) -> OptResult<f64> {
            evals.fetch_add(1, Ordering::Relaxed);
            Shifted.value(t, &())
        }
        fn check(&self, _: &Theta, _: &AtomicUsize) -> OptResult<()> {
            Ok(())
        }
        fn grad(&self, t: &Theta, _: &AtomicUsize) -> OptResult<Grad> {
            Shifted.grad(t, &())
        }
    }

    fn counted_evals(upper: f64) -> (usize, ProfileSeries) {
        let bounds = Bounds::new(array![-10.0, -20.0], array![upper, 20.0]).expect("bounds");
        let problem =
            LikelihoodProblem::new(Counted, AtomicUsize::new(0), bounds, array![0.0, 0.0])
                .expect("problem");
        let opts = UnivariateOptions::default().with_resolution(Resolution::Uniform(64));
        let results = profile_univariate(&problem, &optimum(), &[0], &opts).expect("config");
        let series = results.get(&0).expect("series").clone();
        (problem.data().load(Ordering::Relaxed), series)
    }

    #[test]
    // Purpose
    // -------
    // An optimum on its upper bound adds no solves on that side and keeps the
    // spline-root lower limit.
    //
    // Given
    // -----
    // - `Counted` with θ̂₀ = 3, resolution 64; upper bound 10 vs upper bound 3.
    //
    // Expect
    // ------
    // - Fewer evaluations with the bound at 3; the series ends at 3.
    // - Spline-root interval with lower ≈ 1.04 within 1 % and upper = 3.
    fn optimum_on_bound_skips_that_side() {
        let (interior_evals, interior) = counted_evals(10.0);
        let (bound_evals, series) = counted_evals(3.0);
        assert!(bound_evals < interior_evals, "{bound_evals} vs {interior_evals}");

        let values = series.parameter_values();
        assert_eq!(values[values.len() - 1], 3.0);
        assert!(values.windows(2).all(|w| w[0] < w[1]));

        let ci = series.interval();
        assert_eq!(ci.method, IntervalMethod::SplineRoot);
        assert!((ci.lower - 1.04).abs() < 0.0104, "{ci:?}");
        assert_eq!(ci.upper, 3.0);
        assert!((ci.lower - interior.interval().lower).abs() < 1e-6);
    }

    #[test]
    fn refine_and_parallel_refine_agree() {
        let base = UnivariateOptions::default()
            .with_resolution(Resolution::Uniform(5))
            .with_min_steps(8);
        let serial = profile_univariate(&problem(), &optimum(), &[0], &base).expect("config");
        let parallel_opts = base.clone().with_refill(RefillPolicy::ParallelRefine);
        let parallel =
            profile_univariate(&problem(), &optimum(), &[0], &parallel_opts).expect("config");
        let (a, b) = (serial.get(&0).expect("serial"), parallel.get(&0).expect("parallel"));
        assert!(a.len() >= 15, "{}", a.len());
        assert_eq!(a.parameter_values(), b.parameter_values());
        for (x, y) in a.profile_values().iter().zip(b.profile_values()) {
            assert!((x - y).abs() < 1e-8);
        }
    }

    #[test]
    // Purpose
    // -------
    // Refining an existing series keeps every recorded pair and reaches the
    // requested count.
    //
    // Given
    // -----
    // - A resolution-5 series refined to 30 points with `refine_profile`.
    //
    // Expect
    // ------
    // - At least 30 points; every old `(value, profile)` pair present.
    fn refine_profile_keeps_existing_pairs() {
        let opts = UnivariateOptions::default()
            .with_resolution(Resolution::Uniform(5))
            .with_min_steps(2);
        let mut results = profile_univariate(&problem(), &optimum(), &[0], &opts).expect("config");
        let before = results.get(&0).expect("series").clone();

        refine_profile(&mut results, &problem(), &optimum(), &[0], 30, &opts).expect("config");
        let after = results.get(&0).expect("refined");
        assert!(after.len() >= 30);
        for (v, p) in before.parameter_values().iter().zip(before.profile_values()) {
            let k = after.parameter_values().iter().position(|x| x == v).expect("old value kept");
            assert_eq!(after.profile_values()[k], *p);
        }
        assert!(after.parameter_values().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn refine_profile_requires_existing_series() {
        let mut results = ProfileResults::new(problem().names().clone());
        let err = refine_profile(
            &mut results,
            &problem(),
            &optimum(),
            &[1],
            10,
            &UnivariateOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, ProfileError::MissingProfile { key: "nu".into() });
    }

    #[test]
    fn replace_profile_only_touches_requested_entries() {
        let opts = UnivariateOptions::default().with_resolution(Resolution::Uniform(20));
        let mut results =
            profile_univariate(&problem(), &optimum(), &[0, 1], &opts).expect("config");
        let nu = results.get(&1).expect("nu").clone();
        let extrema = opts.clone().with_interval(IntervalMethod::Extrema);
        replace_profile(&mut results, &problem(), &optimum(), &[0], &extrema).expect("config");
        assert_eq!(results.get(&0).expect("mu").interval().method, IntervalMethod::Extrema);
        assert_eq!(results.get(&1), Some(&nu));
    }

    #[test]
    fn refinement_targets_skip_existing_values() {
        let targets = refinement_targets(&[0.0, 1.0, 4.0], 5);
        assert_eq!(targets, vec![2.0, 3.0]);
        let targets = refinement_targets(&[0.0, 2.0, 3.0], 5);
        assert_eq!(targets, vec![0.75, 1.5, 2.25]);
        let targets = refinement_targets(&[0.0, 0.5, 1.0], 3);
        assert!(targets.is_empty());
    }

    #[test]
    fn configuration_errors_abort_before_profiling() {
        let opts = UnivariateOptions::default();
        assert_eq!(
            profile_univariate(&problem(), &optimum(), &[], &opts).unwrap_err(),
            ProfileError::NothingToProfile
        );
        assert_eq!(
            profile_univariate(&problem(), &optimum(), &[0, 0], &opts).unwrap_err(),
            ProfileError::DuplicateIndices { index: 0 }
        );
        assert!(matches!(
            profile_univariate(&problem(), &optimum(), &[2], &opts),
            Err(ProfileError::IndexOutOfRange { index: 2, .. })
        ));
        let bad = opts.with_resolution(Resolution::Uniform(1));
        assert!(matches!(
            profile_univariate(&problem(), &optimum(), &[0], &bad),
            Err(ProfileError::InvalidResolution { .. })
        ));
    }
}
