//! Type A evaluation from repeated observations.
//!
//! The best estimate is the arithmetic mean `x̄` of the `n` indications and
//! `s` their sample standard deviation (`ddof = 1`). Following JCGM
//! 101:2008 §6.4.9 the quantity is assigned a scaled and shifted
//! t-distribution with `n − 1` degrees of freedom, whose standard deviation
//! is
//!
//! ```text
//! u(x) = √((n − 1)/(n − 3)) · s/√n
//! ```
//!
//! The variance inflation is only defined for `n > 3`.

use rand::Rng;

use crate::error::{Result, UncertaintyError};
use crate::random;
use crate::stats;

/// Evaluation method recorded when none is given.
pub const DEFAULT_METHOD: &str = "Direct";

/// Evaluation kind recorded when none is given.
pub const DEFAULT_UNC_EVAL: &str = "Experimental";

/// Fewest observations for which `(n − 1)/(n − 3)` is positive and finite.
pub const MIN_OBSERVATIONS: usize = 4;

/// A series of direct observations of one input quantity.
///
/// # Examples
/// ```
/// use u_metrology::DirectObservations;
/// let obs = DirectObservations::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(obs.mean(), 3.5);
/// assert!((obs.standard_uncertainty() - 0.9860).abs() < 5e-5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DirectObservations {
    observations: Vec<f64>,
    mean: f64,
    std: f64,
    method: String,
    unc_eval: String,
}

impl DirectObservations {
    /// # Errors
    /// - `InsufficientObservations` if fewer than four values are given.
    /// - `InvalidParameters` if any value is NaN or infinite.
    pub fn new(observations: impl Into<Vec<f64>>) -> Result<Self> {
        let observations = observations.into();
        let n = observations.len();
        if n < MIN_OBSERVATIONS {
            return Err(UncertaintyError::InsufficientObservations(n));
        }
        let non_finite = || {
            UncertaintyError::InvalidParameters("observations must all be finite".into())
        };
        let summary = stats::Summary::of(&observations).ok_or_else(non_finite)?;
        Ok(Self {
            observations,
            mean: summary.mean,
            std: summary.std_dev,
            method: DEFAULT_METHOD.to_string(),
            unc_eval: DEFAULT_UNC_EVAL.to_string(),
        })
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_unc_eval(mut self, unc_eval: impl Into<String>) -> Self {
        self.unc_eval = unc_eval.into();
        self
    }

    pub fn observations(&self) -> &[f64] {
        &self.observations
    }

    /// Number of observations `n`.
    pub fn n(&self) -> usize {
        self.observations.len()
    }

    /// Arithmetic mean, the nominal value of the quantity.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation `s` (`ddof = 1`).
    pub fn std_dev(&self) -> f64 {
        self.std
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn unc_eval(&self) -> &str {
        &self.unc_eval
    }

    /// `u = √((n − 1)/(n − 3)) · s/√n`.
    pub fn standard_uncertainty(&self) -> f64 {
        let n = self.n() as f64;
        ((n - 1.0) / (n - 3.0)).sqrt() * self.std / n.sqrt()
    }

    /// Draws from `x̄ + t_{n−1} · s/√n`.
    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Result<Vec<f64>> {
        random::student_t(rng, count, self.n() as f64, self.mean, self.std)
    }
}

// ============================================================================
// Tests
// ============================================================================
