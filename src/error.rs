//! Error type shared by every fallible operation in the crate.
//!
//! All failures are local validation errors raised where they are detected.
//! Nothing is retried or recovered; callers decide how to present them.

use thiserror::Error;

/// Errors raised while building uncertainties, sampling, or combining
/// Monte Carlo sample sets.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UncertaintyError {
    /// Coverage probability / coverage factor pair is malformed or inconsistent.
    #[error("invalid coverage: {0}")]
    InvalidCoverage(String),

    /// The standard uncertainty was never computed for this quantity.
    #[error("the standard uncertainty has not been initialized")]
    UninitializedUncertainty,

    /// Sampling was requested without a draw count and nothing is cached yet.
    #[error("no draw count given and no sample set has been generated yet")]
    SamplingState,

    /// Trapezoidal shape factor outside `[0, 1]`.
    #[error("the shape factor must lie in [0, 1], got {0}")]
    InvalidShapeFactor(f64),

    /// Too few observations for the Type A variance inflation `(n−1)/(n−3)`.
    #[error("at least 4 observations are required, got {0}")]
    InsufficientObservations(usize),

    /// Unrecognized distribution tag during deserialization.
    #[error("unknown distribution kind '{0}'")]
    UnknownDistributionKind(String),

    /// Divisor contains a zero element.
    #[error("division by zero at sample index {index}")]
    DivisionByZero { index: usize },

    /// Elementwise arithmetic between sets drawn with different N.
    #[error("sample sets differ in length: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    /// Parameters violate a distribution constraint.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// A record field is missing or has the wrong shape.
    #[error("invalid record field '{field}': {reason}")]
    InvalidRecord { field: String, reason: String },
}

impl UncertaintyError {
    pub(crate) fn invalid_record(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, UncertaintyError>;
