//! Errors for the profiling engine (configuration, per-parameter numerics).
//!
//! [`ProfileError`] separates two families:
//! - **Configuration errors** (unknown option names, infinite bounds on a
//!   profiled parameter, bad resolutions or indices). Drivers validate these
//!   before the first optimizer call and abort the whole request.
//! - **Per-parameter errors** (optimizer failure at the starting guess,
//!   interpolant construction, root bracketing). These are stored next to
//!   the successful profiles so a batch can complete partially.
use crate::optimization::errors::OptError;

/// Result alias for profiling operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    // ---- Configuration ----
    /// Unrecognized initial-estimate strategy name.
    UnknownStrategy { name: String, valid: &'static str },

    /// Unrecognized refill policy name.
    UnknownRefillPolicy { name: String },

    /// Unrecognized confidence-interval method name.
    UnknownIntervalMethod { name: String },

    /// Unrecognized execution mode name.
    UnknownExecution { name: String },

    /// A profiled parameter needs finite lower and upper bounds.
    InfiniteBound { index: usize, name: String, lower: f64, upper: f64 },

    /// Confidence level must lie strictly inside (0, 1).
    InvalidConfidenceLevel { level: f64 },

    /// Resolution must be at least 2 for every profiled parameter.
    InvalidResolution { index: usize, resolution: usize },

    /// Per-parameter resolution vector does not cover every parameter.
    ResolutionLengthMismatch { expected: usize, found: usize },

    /// Parameter index outside `0..n_params`.
    IndexOutOfRange { index: usize, n_params: usize },

    /// A parameter name that the model does not declare.
    UnknownParameterName { name: String },

    /// The same parameter name was declared twice.
    DuplicateParameterName { name: String },

    /// A parameter was requested twice, or a pair repeats one index.
    DuplicateIndices { index: usize },

    /// No parameters were requested.
    NothingToProfile,

    /// Vector lengths that must agree do not.
    DimensionMismatch { what: &'static str, expected: usize, found: usize },

    /// The optimum lies outside the declared bounds.
    OptimumOutsideBounds { index: usize, value: f64, lower: f64, upper: f64 },

    /// The optimum must be finite.
    NonFiniteOptimum { index: Option<usize>, value: f64 },

    // ---- Per-parameter numerics ----
    /// The optimizer failed and the restricted objective could not be
    /// evaluated at the initial guess either.
    Optimization { value: f64, source: OptError },

    /// Interpolant construction failed for the assembled points.
    Interpolation { reason: &'static str, points: usize },

    /// A root was requested on a bracket without a sign change.
    RootNotBracketed { lower: f64, upper: f64, f_lower: f64, f_upper: f64 },

    /// The root finder did not return a usable root.
    RootFindingFailed { reason: String },

    /// A re-profiling request referenced a profile that does not exist.
    MissingProfile { key: String },

    /// Backend optimizer error outside a profile point (e.g. model fitting).
    Optimizer(OptError),
}

impl std::error::Error for ProfileError {}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            ProfileError::UnknownStrategy { name, valid } => {
                write!(f, "Unknown initial-estimate strategy '{name}'. Valid options: {valid}")
            }
            ProfileError::UnknownRefillPolicy { name } => {
                write!(
                    f,
                    "Unknown refill policy '{name}'. \
                     Valid options: replace, refine, parallel-refine"
                )
            }
            ProfileError::UnknownIntervalMethod { name } => {
                write!(
                    f,
                    "Unknown confidence-interval method '{name}'. \
                     Valid options: spline-root, extrema"
                )
            }
            ProfileError::UnknownExecution { name } => {
                write!(f, "Unknown execution mode '{name}'. Valid options: serial, parallel")
            }
            ProfileError::InfiniteBound { index, name, lower, upper } => {
                write!(
                    f,
                    "Parameter {index} ('{name}') has bounds [{lower}, {upper}]; \
                     profiled parameters need finite bounds"
                )
            }
            ProfileError::InvalidConfidenceLevel { level } => {
                write!(f, "Invalid confidence level {level}: must lie strictly between 0 and 1")
            }
            ProfileError::InvalidResolution { index, resolution } => {
                write!(
                    f,
                    "Invalid resolution {resolution} for parameter {index}: must be at least 2"
                )
            }
            ProfileError::ResolutionLengthMismatch { expected, found } => {
                write!(f, "Per-parameter resolution has {found} entries, expected {expected}")
            }
            ProfileError::IndexOutOfRange { index, n_params } => {
                write!(
                    f,
                    "Parameter index {index} out of range for a model with {n_params} parameters"
                )
            }
            ProfileError::UnknownParameterName { name } => {
                write!(f, "Unknown parameter name '{name}'")
            }
            ProfileError::DuplicateParameterName { name } => {
                write!(f, "Parameter name '{name}' is declared more than once")
            }
            ProfileError::DuplicateIndices { index } => {
                write!(f, "Parameter index {index} requested more than once")
            }
            ProfileError::NothingToProfile => write!(f, "No parameters requested for profiling"),
            ProfileError::DimensionMismatch { what, expected, found } => {
                write!(f, "Dimension mismatch for {what}: expected {expected}, found {found}")
            }
            ProfileError::OptimumOutsideBounds { index, value, lower, upper } => {
                write!(f, "Optimum coordinate {index} = {value} lies outside [{lower}, {upper}]")
            }
            ProfileError::NonFiniteOptimum { index: Some(i), value } => {
                write!(f, "Optimum coordinate {i} is not finite: {value}")
            }
            ProfileError::NonFiniteOptimum { index: None, value } => {
                write!(f, "Optimum log-likelihood is not finite: {value}")
            }

            // ---- Per-parameter numerics ----
            ProfileError::Optimization { value, source } => {
                write!(f, "Restricted problem failed at fixed value {value}: {source}")
            }
            ProfileError::Interpolation { reason, points } => {
                write!(
                    f,
                    "Could not build interpolant from {points} points: {reason}. \
                     Try a higher resolution or more minimum steps/layers"
                )
            }
            ProfileError::RootNotBracketed { lower, upper, f_lower, f_upper } => {
                write!(
                    f,
                    "No sign change on [{lower}, {upper}]: \
                     f(lower) = {f_lower}, f(upper) = {f_upper}"
                )
            }
            ProfileError::RootFindingFailed { reason } => {
                write!(f, "Root finding failed: {reason}")
            }
            ProfileError::MissingProfile { key } => {
                write!(f, "No existing profile for {key}")
            }
            ProfileError::Optimizer(err) => write!(f, "Optimizer error: {err}"),
        }
    }
}

impl From<OptError> for ProfileError {
    fn from(err: OptError) -> Self {
        ProfileError::Optimizer(err)
    }
}

impl ProfileError {
    /// Whether the error stems from configuration and must abort a request.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            ProfileError::Optimization { .. }
                | ProfileError::Interpolation { .. }
                | ProfileError::RootNotBracketed { .. }
                | ProfileError::RootFindingFailed { .. }
                | ProfileError::Optimizer(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_bound_message_names_parameter() {
        let err = ProfileError::InfiniteBound {
            index: 1,
            name: "sigma".to_string(),
            lower: 0.0,
            upper: f64::INFINITY,
        };
        let msg = err.to_string();
        assert!(msg.contains("'sigma'"), "unexpected message: {msg}");
        assert!(err.is_configuration());
    }

    #[test]
    fn interpolation_error_suggests_more_points() {
        let err = ProfileError::Interpolation { reason: "too few points", points: 1 };
        assert!(err.to_string().contains("higher resolution"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn opt_error_converts_into_optimizer_variant() {
        let err: ProfileError = OptError::NoTolerancesProvided.into();
        assert_eq!(err, ProfileError::Optimizer(OptError::NoTolerancesProvided));
    }
}
