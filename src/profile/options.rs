//! Configuration for profiling runs.
//!
//! [`UnivariateOptions`] and [`BivariateOptions`] collect everything a driver
//! needs besides the problem and its optimum. Named choices are closed enums
//! parsed case-insensitively with `FromStr`; numeric settings are validated
//! when set, and again by the drivers before any optimizer call.
use std::str::FromStr;

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::{
    optimization::loglik_optimizer::MLEOptions,
    profile::{
        errors::{ProfileError, ProfileResult},
        strategy::{NextEstimate1D, NextEstimate2D},
    },
};

fn normalize_name(s: &str) -> String {
    s.trim().to_lowercase().replace(['_', ' '], "-")
}

/// What to do when a direction reaches the threshold in fewer than
/// `min_steps` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefillPolicy {
    /// Discard the direction and re-walk exactly `min_steps` evenly spaced
    /// points between the optimum and the last evaluated value.
    Replace,
    /// Keep the points and solve extra interior points one after another.
    #[default]
    Refine,
    /// As `Refine`, with the extra points solved on the rayon pool.
    ParallelRefine,
}

impl FromStr for RefillPolicy {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "replace" => Ok(RefillPolicy::Replace),
            "refine" => Ok(RefillPolicy::Refine),
            "parallel-refine" | "parallelrefine" => Ok(RefillPolicy::ParallelRefine),
            _ => Err(ProfileError::UnknownRefillPolicy { name: s.to_string() }),
        }
    }
}

/// How a confidence interval is read off a profile series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntervalMethod {
    /// Roots of the interpolated profile minus the threshold.
    #[default]
    SplineRoot,
    /// Smallest and largest evaluated value above the threshold.
    Extrema,
}

impl FromStr for IntervalMethod {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "spline-root" | "spline" | "splineroot" => Ok(IntervalMethod::SplineRoot),
            "extrema" => Ok(IntervalMethod::Extrema),
            _ => Err(ProfileError::UnknownIntervalMethod { name: s.to_string() }),
        }
    }
}

/// Whether profiled parameters, directions and grid nodes run on the rayon pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    #[default]
    Serial,
    Parallel,
}

impl FromStr for Execution {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "serial" => Ok(Execution::Serial),
            "parallel" | "threaded" => Ok(Execution::Parallel),
            _ => Err(ProfileError::UnknownExecution { name: s.to_string() }),
        }
    }
}

/// Number of candidate values per direction (1-D) or per axis side (2-D).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Uniform(usize),
    /// One entry per model parameter, indexed like `θ`.
    PerParameter(Vec<usize>),
}

impl Default for Resolution {
    fn default() -> Self {
        Resolution::Uniform(64)
    }
}

impl Resolution {
    /// Resolution of parameter `index`.
    pub fn for_param(&self, index: usize) -> usize {
        match self {
            Resolution::Uniform(r) => *r,
            Resolution::PerParameter(rs) => rs.get(index).copied().unwrap_or(0),
        }
    }

    /// Check the shape against the model and every requested parameter.
    ///
    /// # Errors
    /// - [`ProfileError::ResolutionLengthMismatch`] for a per-parameter vector
    ///   of the wrong length.
    /// - [`ProfileError::InvalidResolution`] for a requested parameter with
    ///   fewer than two candidate values.
    pub fn validate(&self, n_params: usize, requested: &[usize]) -> ProfileResult<()> {
        if let Resolution::PerParameter(rs) = self {
            if rs.len() != n_params {
                return Err(ProfileError::ResolutionLengthMismatch {
                    expected: n_params,
                    found: rs.len(),
                });
            }
        }
        for &index in requested {
            let resolution = self.for_param(index);
            if resolution < 2 {
                return Err(ProfileError::InvalidResolution { index, resolution });
            }
        }
        Ok(())
    }
}

/// Confidence level in `(0, 1)` and the profile threshold it implies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceLevel(f64);

impl ConfidenceLevel {
    /// # Errors
    /// [`ProfileError::InvalidConfidenceLevel`] unless `0 < level < 1`.
    pub fn new(level: f64) -> ProfileResult<Self> {
        if level.is_finite() && level > 0.0 && level < 1.0 {
            Ok(Self(level))
        } else {
            Err(ProfileError::InvalidConfidenceLevel { level })
        }
    }

    pub fn level(&self) -> f64 {
        self.0
    }

    /// Profile threshold `−q/2` for the χ² quantile `q` with `df` degrees of
    /// freedom, plus `max_loglik` when profiles are not normalised.
    pub fn threshold(&self, df: u32, max_loglik: f64, normalise: bool) -> ProfileResult<f64> {
        let chi2 = ChiSquared::new(df as f64)
            .map_err(|_| ProfileError::InvalidConfidenceLevel { level: self.0 })?;
        let half = -0.5 * chi2.inverse_cdf(self.0);
        Ok(if normalise { half } else { half + max_loglik })
    }
}

impl Default for ConfidenceLevel {
    fn default() -> Self {
        Self(0.95)
    }
}

/// Options for [`profile_univariate`](crate::profile::univariate::profile_univariate).
#[derive(Debug, Clone, PartialEq)]
pub struct UnivariateOptions {
    pub confidence: ConfidenceLevel,
    pub resolution: Resolution,
    /// Minimum number of points per direction, optimum included.
    pub min_steps: usize,
    pub refill: RefillPolicy,
    pub interval: IntervalMethod,
    pub strategy: NextEstimate1D,
    /// Subtract `ℓ̂` so the profile peaks at zero.
    pub normalise: bool,
    pub execution: Execution,
    pub mle: MLEOptions,
}

impl Default for UnivariateOptions {
    fn default() -> Self {
        Self {
            confidence: ConfidenceLevel::default(),
            resolution: Resolution::default(),
            min_steps: 10,
            refill: RefillPolicy::default(),
            interval: IntervalMethod::default(),
            strategy: NextEstimate1D::default(),
            normalise: true,
            execution: Execution::default(),
            mle: MLEOptions::default(),
        }
    }
}

impl UnivariateOptions {
    pub fn with_confidence_level(mut self, level: f64) -> ProfileResult<Self> {
        self.confidence = ConfidenceLevel::new(level)?;
        Ok(self)
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_min_steps(mut self, min_steps: usize) -> Self {
        self.min_steps = min_steps;
        self
    }

    pub fn with_refill(mut self, refill: RefillPolicy) -> Self {
        self.refill = refill;
        self
    }

    pub fn with_interval(mut self, interval: IntervalMethod) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_strategy(mut self, strategy: NextEstimate1D) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_normalise(mut self, normalise: bool) -> Self {
        self.normalise = normalise;
        self
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_mle_options(mut self, mle: MLEOptions) -> Self {
        self.mle = mle;
        self
    }

    /// Threshold for one profiled parameter (χ², one degree of freedom).
    pub fn threshold(&self, max_loglik: f64) -> ProfileResult<f64> {
        self.confidence.threshold(1, max_loglik, self.normalise)
    }

    /// Offset subtracted from every restricted log-likelihood.
    pub fn shift(&self, max_loglik: f64) -> f64 {
        if self.normalise { max_loglik } else { 0.0 }
    }
}

/// Options for [`profile_bivariate`](crate::profile::bivariate::profile_bivariate).
#[derive(Debug, Clone, PartialEq)]
pub struct BivariateOptions {
    pub confidence: ConfidenceLevel,
    /// Grid offsets from the optimum to each bound, per axis.
    pub resolution: Resolution,
    /// Layers grown before the stopping rule may fire.
    pub min_layers: usize,
    /// Layers entirely below the threshold grown past the region.
    pub extra_layers: usize,
    pub strategy: NextEstimate2D,
    pub normalise: bool,
    pub execution: Execution,
    pub mle: MLEOptions,
}

impl Default for BivariateOptions {
    fn default() -> Self {
        Self {
            confidence: ConfidenceLevel::default(),
            resolution: Resolution::Uniform(20),
            min_layers: 5,
            extra_layers: 1,
            strategy: NextEstimate2D::default(),
            normalise: true,
            execution: Execution::default(),
            mle: MLEOptions::default(),
        }
    }
}

impl BivariateOptions {
    pub fn with_confidence_level(mut self, level: f64) -> ProfileResult<Self> {
        self.confidence = ConfidenceLevel::new(level)?;
        Ok(self)
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_min_layers(mut self, min_layers: usize) -> Self {
        self.min_layers = min_layers;
        self
    }

    pub fn with_extra_layers(mut self, extra_layers: usize) -> Self {
        self.extra_layers = extra_layers;
        self
    }

    pub fn with_strategy(mut self, strategy: NextEstimate2D) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_normalise(mut self, normalise: bool) -> Self {
        self.normalise = normalise;
        self
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_mle_options(mut self, mle: MLEOptions) -> Self {
        self.mle = mle;
        self
    }

    /// Threshold for a profiled pair (χ², two degrees of freedom).
    pub fn threshold(&self, max_loglik: f64) -> ProfileResult<f64> {
        self.confidence.threshold(2, max_loglik, self.normalise)
    }

    pub fn shift(&self, max_loglik: f64) -> f64 {
        if self.normalise { max_loglik } else { 0.0 }
    }
}
