//! Initial-estimate strategies for restricted solves.
//!
//! Each new restricted problem starts from a guess for the nuisance
//! parameters. The 1-D strategies look at the points already solved along
//! the current direction; the 2-D strategies look at the layers already
//! grown around the optimum. Unknown names are rejected by `FromStr`, before
//! any optimization work starts.
use std::str::FromStr;

use crate::{
    optimization::loglik_optimizer::{Bounds, Theta},
    profile::{
        errors::ProfileError,
        interpolation::locate,
        ranges::ProfileGrid,
        univariate::ProfilePoint,
    },
};

/// Strategy for univariate profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NextEstimate1D {
    /// Reuse the most recently solved nuisance vector.
    Previous,
    /// Extrapolate the line through the last two solved points; falls back
    /// to `Previous` when infeasible or with fewer than two points.
    #[default]
    LinearInterpolate,
}

impl FromStr for NextEstimate1D {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "prev" | "previous" => Ok(NextEstimate1D::Previous),
            "interp" | "linear" | "linear-interpolate" => Ok(NextEstimate1D::LinearInterpolate),
            _ => Err(ProfileError::UnknownStrategy {
                name: s.to_string(),
                valid: "prev, interp",
            }),
        }
    }
}

impl NextEstimate1D {
    /// Guess for the nuisance parameters at `target`, or `None` without history.
    pub fn next(&self, history: &[ProfilePoint], target: f64, bounds: &Bounds) -> Option<Theta> {
        let last = history.last()?;
        match self {
            NextEstimate1D::Previous => Some(last.nuisance.clone()),
            NextEstimate1D::LinearInterpolate => {
                let extrapolated = history
                    .len()
                    .checked_sub(2)
                    .map(|k| &history[k])
                    .filter(|prev| prev.value != last.value)
                    .map(|prev| {
                        let w = (target - last.value) / (last.value - prev.value);
                        &last.nuisance + &((&last.nuisance - &prev.nuisance) * w)
                    })
                    .filter(|guess| guess.iter().all(|v| v.is_finite()) && bounds.contains(guess));
                Some(extrapolated.unwrap_or_else(|| last.nuisance.clone()))
            }
        }
    }
}

/// Read access to the nuisance vectors solved on a bivariate grid.
pub trait SolvedGrid {
    /// Nuisance vector at a grid offset, if that node has been solved.
    fn nuisance_at(&self, offset: (isize, isize)) -> Option<&Theta>;

    /// Radius of the square of completely solved layers.
    fn filled_radius(&self) -> Option<usize>;
}

/// Strategy for bivariate profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NextEstimate2D {
    /// Always start from the joint optimum.
    Center,
    /// Start from the closest node of the previous layer.
    #[default]
    NearestNeighbor,
    /// Bilinear interpolation/extrapolation over all solved layers; falls
    /// back to `Center` when infeasible.
    GridInterpolate,
}

impl FromStr for NextEstimate2D {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mle" | "center" | "centre" => Ok(NextEstimate2D::Center),
            "nearest" | "nearest-neighbor" | "nearest-neighbour" => {
                Ok(NextEstimate2D::NearestNeighbor)
            }
            "interp" | "grid-interpolate" => Ok(NextEstimate2D::GridInterpolate),
            _ => Err(ProfileError::UnknownStrategy {
                name: s.to_string(),
                valid: "mle, nearest, interp",
            }),
        }
    }
}

impl NextEstimate2D {
    /// Guess for the nuisance parameters at grid node `node`.
    pub fn next<S: SolvedGrid + ?Sized>(
        &self, node: (isize, isize), grid: &ProfileGrid, solved: &S, centre: &Theta,
        bounds: &Bounds,
    ) -> Theta {
        let radius = solved.filled_radius().unwrap_or(0);
        match self {
            NextEstimate2D::Center => centre.clone(),
            NextEstimate2D::NearestNeighbor => {
                let r = radius as isize;
                let nearest = grid.clamp_offset((node.0.clamp(-r, r), node.1.clamp(-r, r)));
                solved.nuisance_at(nearest).cloned().unwrap_or_else(|| centre.clone())
            }
            NextEstimate2D::GridInterpolate => {
                if radius == 0 {
                    return centre.clone();
                }
                grid_interpolate(node, grid, solved, radius)
                    .filter(|g| g.iter().all(|v| v.is_finite()) && bounds.contains(g))
                    .unwrap_or_else(|| centre.clone())
            }
        }
    }
}

fn grid_interpolate<S: SolvedGrid + ?Sized>(
    node: (isize, isize), grid: &ProfileGrid, solved: &S, radius: usize,
) -> Option<Theta> {
    let xs = grid.axes[0].coordinates(radius);
    let ys = grid.axes[1].coordinates(radius);
    let (x, y) = grid.point(node);
    let (i, t) = locate(&xs, x);
    let (j, u) = locate(&ys, y);
    let r = radius as isize;
    let (i, j) = (i as isize - r, j as isize - r);
    let n00 = solved.nuisance_at((i, j))?;
    let n10 = solved.nuisance_at((i + 1, j))?;
    let n01 = solved.nuisance_at((i, j + 1))?;
    let n11 = solved.nuisance_at((i + 1, j + 1))?;
    Some(
        n00 * ((1.0 - t) * (1.0 - u))
            + n10 * (t * (1.0 - u))
            + n01 * ((1.0 - t) * u)
            + n11 * (t * u),
    )
}
