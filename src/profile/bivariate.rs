//! Bivariate profiles: grow square layers of grid nodes around a joint
//! optimum until the confidence region is enclosed.
//!
//! Layer `L` is the ring of offsets at Chebyshev distance `L` from the optimum
//! cell (see [`layer_ring`]). Seeds for a layer are computed from the layers
//! already solved, then every node of the layer is solved, serially with one
//! restricted problem or on the rayon pool with one per worker. Growth stops
//! once more than `extra_layers` layers stayed entirely at or below the
//! threshold and at least `min_layers` layers exist, or when the grid is
//! exhausted. Nodes beyond a bound the optimum sits on are left unsolved.
use rayon::prelude::*;

use crate::{
    optimization::loglik_optimizer::{LogLikelihood, Theta},
    profile::{
        errors::{ProfileError, ProfileResult},
        options::{BivariateOptions, Execution},
        problem::{LikelihoodProblem, ModelOptimum},
        ranges::{GridAxis, ProfileGrid, SquareArena, layer_ring},
        restricted::{FixedIndices, ProblemTemplate, RestrictedProblem, RestrictedSolution},
        results::{BivariateResults, ProfileResults, ProfileSurface, ResultSink},
        strategy::SolvedGrid,
    },
};

/// One solved node of a bivariate grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridNode {
    pub profile: f64,
    pub nuisance: Theta,
    pub converged: bool,
}

impl SolvedGrid for SquareArena<GridNode> {
    fn nuisance_at(&self, offset: (isize, isize)) -> Option<&Theta> {
        self.get(offset).map(|node| &node.nuisance)
    }

    fn filled_radius(&self) -> Option<usize> {
        self.filled_layers()
    }
}

/// Profile each parameter pair in `pairs` on a grid around the optimum.
///
/// # Errors
/// Configuration errors only; numerical failures of a pair are stored in
/// [`ProfileResults::failures`].
pub fn profile_bivariate<F>(
    problem: &LikelihoodProblem<F>, optimum: &ModelOptimum, pairs: &[(usize, usize)],
    opts: &BivariateOptions,
) -> ProfileResult<BivariateResults>
where
    F: LogLikelihood + Sync,
    F::Data: Sync,
{
    let mut results = ProfileResults::new(problem.names().clone());
    replace_surfaces(&mut results, problem, optimum, pairs, opts)?;
    Ok(results)
}

/// Recompute the surfaces of `pairs` and splice them into `results`.
pub fn replace_surfaces<F>(
    results: &mut BivariateResults, problem: &LikelihoodProblem<F>, optimum: &ModelOptimum,
    pairs: &[(usize, usize)], opts: &BivariateOptions,
) -> ProfileResult<()>
where
    F: LogLikelihood + Sync,
    F::Data: Sync,
{
    validate(problem, optimum, pairs, opts)?;
    let threshold = opts.threshold(optimum.max_loglik())?;
    let sink = ResultSink::new(results);
    let run = |&pair: &(usize, usize)| {
        let outcome = profile_pair(problem, optimum, pair, threshold, opts);
        let names = problem.names();
        let (a, b) =
            (names.name(pair.0).unwrap_or_default(), names.name(pair.1).unwrap_or_default());
        match &outcome {
            Ok(surface) => log::info!(
                "profiled ({a}, {b}) over {} layers, region of {} vertices",
                surface.layers(),
                surface.region().boundary.len()
            ),
            Err(err) => log::warn!("profiling ({a}, {b}) failed: {err}"),
        }
        sink.insert(pair, outcome);
    };
    match opts.execution {
        Execution::Serial => pairs.iter().for_each(run),
        Execution::Parallel => pairs.par_iter().for_each(run),
    }
    Ok(())
}

fn validate<F: LogLikelihood>(
    problem: &LikelihoodProblem<F>, optimum: &ModelOptimum, pairs: &[(usize, usize)],
    opts: &BivariateOptions,
) -> ProfileResult<()> {
    if pairs.is_empty() {
        return Err(ProfileError::NothingToProfile);
    }
    problem.check_optimum(optimum)?;
    let mut requested = Vec::with_capacity(2 * pairs.len());
    for (k, &(a, b)) in pairs.iter().enumerate() {
        problem.check_profilable(a)?;
        problem.check_profilable(b)?;
        if a == b || pairs[..k].contains(&(a, b)) {
            return Err(ProfileError::DuplicateIndices { index: a });
        }
        requested.extend([a, b]);
    }
    opts.resolution.validate(problem.n_params(), &requested)
}

fn profile_pair<F>(
    problem: &LikelihoodProblem<F>, optimum: &ModelOptimum, (a, b): (usize, usize),
    threshold: f64, opts: &BivariateOptions,
) -> ProfileResult<ProfileSurface>
where
    F: LogLikelihood + Sync,
    F::Data: Sync,
{
    let shift = opts.shift(optimum.max_loglik());
    let template =
        ProblemTemplate::new(problem, optimum, FixedIndices::Pair(a, b), shift, &opts.mle)?;
    let (theta, bounds) = (optimum.theta_hat(), problem.bounds());
    let axis = |i: usize| {
        GridAxis::new(theta[i], bounds.lower()[i], bounds.upper()[i], opts.resolution.for_param(i))
    };
    let grid = ProfileGrid::new(axis(a), axis(b));
    let max_layers = grid.max_layers();

    let centre = template.optimum_nuisance();
    let mut arena = SquareArena::new(max_layers);
    arena.set(
        (0, 0),
        GridNode {
            profile: optimum.max_loglik() - shift,
            nuisance: centre.clone(),
            converged: true,
        },
    );
    arena.mark_filled(0);

    let mut outer = 0;
    let mut layer = 0;
    while layer < max_layers {
        layer += 1;
        let ring: Vec<_> = layer_ring(layer).into_iter().filter(|&n| grid.admits(n)).collect();
        let seeds: Vec<Theta> = ring
            .iter()
            .map(|&node| opts.strategy.next(node, &grid, &arena, &centre, template.free_bounds()))
            .collect();
        let solved: Vec<ProfileResult<RestrictedSolution>> = match opts.execution {
            Execution::Serial => {
                let mut restricted = template.instantiate();
                ring.iter()
                    .zip(seeds)
                    .map(|(&node, seed)| solve_node(&mut restricted, &grid, node, seed))
                    .collect()
            }
            Execution::Parallel => ring
                .par_iter()
                .zip(seeds)
                .map_init(
                    || template.instantiate(),
                    |restricted, (&node, seed)| solve_node(restricted, &grid, node, seed),
                )
                .collect(),
        };

        let mut any_above = false;
        for (&node, solution) in ring.iter().zip(solved) {
            let solution = solution?;
            any_above |= solution.profile > threshold;
            arena.set(
                node,
                GridNode {
                    profile: solution.profile,
                    nuisance: solution.nuisance,
                    converged: solution.converged,
                },
            );
        }
        arena.mark_filled(layer);
        if !any_above {
            outer += 1;
        }
        log::debug!("layer {layer}/{max_layers}: above threshold = {any_above}, outer = {outer}");
        if outer > opts.extra_layers && layer >= opts.min_layers {
            break;
        }
    }

    ProfileSurface::from_arena(
        arena.crop(layer),
        &grid,
        (theta[a], theta[b]),
        threshold,
        opts.confidence,
    )
}

fn solve_node<F: LogLikelihood>(
    restricted: &mut RestrictedProblem<'_, F>, grid: &ProfileGrid, node: (isize, isize),
    seed: Theta,
) -> ProfileResult<RestrictedSolution> {
    let (x, y) = grid.point(node);
    restricted.set_guess(seed);
    restricted.fix(&[x, y]);
    restricted.solve()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::OptResult,
        loglik_optimizer::{Bounds, Grad},
    };
    use crate::profile::{options::Resolution, strategy::NextEstimate2D};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Layer growth and the stopping rule.
    // - The region of a quadratic bowl against the analytic circle.
    // - Agreement of serial and parallel layer expansion.
    // - An optimum on a bound: the closed side stays unsolved.
    // - Pair validation.
    // -------------------------------------------------------------------------

    /// ℓ = −(x² + y² + (z − x)²)/2: the (x, y) profile is −(x² + y²)/2.
    struct Bowl;

    impl LogLikelihood for Bowl {
        type Data = ();
        fn value(&self, t: &Theta, _: &()) -> OptResult<f64> {
            Ok(-0.5 * (t[0] * t[0] + t[1] * t[1] + (t[2] - t[0]).powi(2)))
        }
        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
        fn grad(&self, t: &Theta, _: &()) -> OptResult<Grad> {
            Ok(array![-t[0] + (t[2] - t[0]), -t[1], -(t[2] - t[0])])
        }
    }

    fn problem() -> LikelihoodProblem<Bowl> {
        let bounds = Bounds::new(array![-5.0, -5.0, -5.0], array![5.0, 5.0, 5.0]).expect("bounds");
        LikelihoodProblem::new(Bowl, (), bounds, array![0.0, 0.0, 0.0]).expect("problem")
    }

    fn optimum() -> ModelOptimum {
        ModelOptimum::new(array![0.0, 0.0, 0.0], 0.0).expect("optimum")
    }

    #[test]
    // Purpose
    // -------
    // Growth stops once two layers lie fully outside the region, and the
    // traced region matches the analytic circle.
    //
    // Given
    // -----
    // - Resolution 20 (step 0.25), df-2 threshold −2.9957 (radius ≈ 2.4477).
    //
    // Expect
    // ------
    // - Layer 10 is the first one entirely outside (0.25·10 > r); growth
    //   stops after `extra_layers + 1` such layers, at 11. Vertices lie
    //   within 0.05 of the circle.
    fn bowl_region_matches_circle() {
        let opts = BivariateOptions::default().with_resolution(Resolution::Uniform(20));
        let results = profile_bivariate(&problem(), &optimum(), &[(0, 1)], &opts).expect("config");
        let surface = results.get(&(0, 1)).expect("surface");
        assert_eq!(surface.layers(), 11);
        let radius = (-2.0 * surface.threshold()).sqrt();
        let region = surface.region();
        assert!(region.boundary.len() > 8);
        for &(x, y) in &region.boundary {
            assert!((x.hypot(y) - radius).abs() < 0.05, "({x}, {y}) vs {radius}");
        }
        assert!(region.contains(0.0, 0.0));
        let node = surface.node((4, 0)).expect("solved node");
        assert!((node.nuisance[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn serial_and_parallel_expansion_agree() {
        let base = BivariateOptions::default()
            .with_resolution(Resolution::Uniform(8))
            .with_strategy(NextEstimate2D::GridInterpolate);
        let serial = profile_bivariate(&problem(), &optimum(), &[(0, 1), (0, 2)], &base)
            .expect("config");
        let par_opts = base.with_execution(Execution::Parallel);
        let parallel = profile_bivariate(&problem(), &optimum(), &[(0, 1), (0, 2)], &par_opts)
            .expect("config");
        for key in [(0, 1), (0, 2)] {
            let (s, p) = (serial.get(&key).expect("serial"), parallel.get(&key).expect("parallel"));
            assert_eq!(s.layers(), p.layers());
            for (a, b) in s.values().iter().zip(p.values()) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // With the optimum on the lower bound of `x`, no node beyond that bound is
    // solved and the region is the half disc on the open side.
    //
    // Given
    // -----
    // - Bowl with `x ∈ [0, 5]`, optimum at the origin, resolution 20.
    //
    // Expect
    // ------
    // - Nodes with negative `x` offset are absent, positive ones are solved.
    // - Every boundary vertex has `x ≥ 0`; those away from `x = 0` lie within
    //   0.05 of the circle.
    // - Growth still stops after 11 layers.
    fn optimum_on_bound_leaves_closed_side_unsolved() {
        let bounds = Bounds::new(array![0.0, -5.0, -5.0], array![5.0, 5.0, 5.0]).expect("bounds");
        let problem =
            LikelihoodProblem::new(Bowl, (), bounds, array![0.0, 0.0, 0.0]).expect("problem");
        let opts = BivariateOptions::default().with_resolution(Resolution::Uniform(20));
        let results = profile_bivariate(&problem, &optimum(), &[(0, 1)], &opts).expect("config");
        let surface = results.get(&(0, 1)).expect("surface");

        assert_eq!(surface.layers(), 11);
        assert!(surface.node((-1, 0)).is_none());
        assert!(surface.node((-3, 2)).is_none());
        assert!(surface.node((1, 0)).is_some());
        assert!(surface.node((0, -4)).is_some());

        let radius = (-2.0 * surface.threshold()).sqrt();
        let region = surface.region();
        assert!(!region.is_empty());
        for &(x, y) in &region.boundary {
            assert!(x >= -1e-12, "({x}, {y})");
            if x > 0.05 {
                assert!((x.hypot(y) - radius).abs() < 0.05, "({x}, {y}) vs {radius}");
            }
        }
        assert!(region.contains(0.5, 0.0));
        assert!(!region.contains(-0.5, 0.0));
    }

    #[test]
    fn growth_stops_at_grid_edge() {
        // The region is wider than the grid, so every layer stays above.
        let opts = BivariateOptions::default()
            .with_resolution(Resolution::Uniform(4))
            .with_confidence_level(0.999_999)
            .expect("level");
        let results = profile_bivariate(&problem(), &optimum(), &[(0, 1)], &opts).expect("config");
        assert_eq!(results.get(&(0, 1)).expect("surface").layers(), 4);
    }

    #[test]
    fn invalid_pairs_are_rejected() {
        let opts = BivariateOptions::default();
        assert_eq!(
            profile_bivariate(&problem(), &optimum(), &[(1, 1)], &opts).unwrap_err(),
            ProfileError::DuplicateIndices { index: 1 }
        );
        assert!(matches!(
            profile_bivariate(&problem(), &optimum(), &[(0, 3)], &opts),
            Err(ProfileError::IndexOutOfRange { index: 3, .. })
        ));
    }
}
