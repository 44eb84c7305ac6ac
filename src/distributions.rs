//! Type B input distributions.
//!
//! Each payload carries the parameters stated for an input quantity and
//! knows its GUM standard uncertainty and Monte Carlo sampling rule. The
//! nominal value and coverage factor live on [`crate::Uncertainty`] and are
//! passed in where a formula needs them.
//!
//! # Standard uncertainties
//!
//! | Distribution | Parameters | u(x) | Reference |
//! |---|---|---|---|
//! | [`Normal`] | expanded uncertainty U | U / k | GUM 4.3.3 |
//! | [`Rectangular`] | half-width a | a / √3 | JCGM 101 §6.4.2 |
//! | [`Triangular`] | half-width a | (b − a) / √24 | JCGM 101 §6.4.5 |
//! | [`Trapezoidal`] | half-width a, shape d | (b − a) / √24 · √(1 + d²) | JCGM 101 §6.4.4 |
//! | [`StudentT`] | expanded uncertainty U, ν | U / k | JCGM 101 §6.4.9 |
//!
//! Here `[a, b]` (written `[lower, upper]` in code) are the limits
//! `value ∓ half-width`.

use rand::Rng;

use crate::error::{Result, UncertaintyError};
use crate::random;

fn check_finite(name: &str, x: f64) -> Result<f64> {
    if x.is_finite() {
        Ok(x)
    } else {
        Err(UncertaintyError::InvalidParameters(format!(
            "{name} must be finite, got {x}"
        )))
    }
}

fn check_non_negative(name: &str, x: f64) -> Result<f64> {
    if check_finite(name, x)? < 0.0 {
        return Err(UncertaintyError::InvalidParameters(format!(
            "{name} must be non-negative, got {x}"
        )));
    }
    Ok(x)
}

/// `U / k`. A zero factor cannot recover a standard uncertainty from `U`.
fn unexpand(uexp: f64, k: f64) -> Result<f64> {
    if k == 0.0 {
        return Err(UncertaintyError::InvalidCoverage(format!(
            "coverage factor 0 cannot convert expanded uncertainty {uexp} to a standard uncertainty"
        )));
    }
    Ok(uexp / k)
}

// ============================================================================
// Normal
// ============================================================================

/// Normal distribution stated by its expanded uncertainty `U`.
#[derive(Debug, Clone, PartialEq)]
pub struct Normal {
    uexp: f64,
}

impl Normal {
    /// # Errors
    /// `InvalidParameters` if `uexp` is negative or not finite.
    pub fn new(uexp: f64) -> Result<Self> {
        Ok(Self {
            uexp: check_non_negative("expanded uncertainty", uexp)?,
        })
    }

    /// The stated expanded uncertainty `U`.
    pub fn uexp(&self) -> f64 {
        self.uexp
    }

    /// `u = U / k`.
    ///
    /// # Errors
    /// `InvalidCoverage` if `k` is zero.
    pub fn standard_uncertainty(&self, k: f64) -> Result<f64> {
        unexpand(self.uexp, k)
    }

    pub(crate) fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        value: f64,
        k: f64,
    ) -> Result<Vec<f64>> {
        Ok(random::normal(rng, count, value, self.standard_uncertainty(k)?))
    }
}

// ============================================================================
// Rectangular
// ============================================================================

/// Rectangular (uniform) distribution on `[value − hlim, value + hlim]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangular {
    hlim: f64,
}

impl Rectangular {
    /// # Errors
    /// `InvalidParameters` if `hlim` is negative or not finite.
    pub fn new(hlim: f64) -> Result<Self> {
        Ok(Self {
            hlim: check_non_negative("half-width", hlim)?,
        })
    }

    /// Half-width of the limits.
    pub fn hlim(&self) -> f64 {
        self.hlim
    }

    /// `u = a / √3`.
    pub fn standard_uncertainty(&self) -> f64 {
        self.hlim / 3.0_f64.sqrt()
    }

    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R, count: usize, value: f64) -> Vec<f64> {
        random::rectangular(rng, count, value - self.hlim, value + self.hlim)
    }
}

// ============================================================================
// Triangular
// ============================================================================

/// Symmetric triangular distribution on `[value − hlim, value + hlim]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangular {
    hlim: f64,
}

impl Triangular {
    /// # Errors
    /// `InvalidParameters` if `hlim` is negative or not finite.
    pub fn new(hlim: f64) -> Result<Self> {
        Ok(Self {
            hlim: check_non_negative("half-width", hlim)?,
        })
    }

    pub fn hlim(&self) -> f64 {
        self.hlim
    }

    /// `u² = (b − a)² / 24`.
    pub fn standard_uncertainty(&self) -> f64 {
        let span = 2.0 * self.hlim;
        (span * span / 24.0).sqrt()
    }

    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R, count: usize, value: f64) -> Vec<f64> {
        random::trapezoidal(rng, count, value - self.hlim, value + self.hlim, 0.0)
    }
}

// ============================================================================
// Trapezoidal
// ============================================================================

/// Symmetric trapezoidal distribution on `[value − hlim, value + hlim]`.
///
/// The shape factor `d ∈ [0, 1]` is the ratio of the top width to the
/// base width: `d = 0` is triangular, `d = 1` rectangular. Both the shape
/// factor and the half-width may be changed after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Trapezoidal {
    hlim: f64,
    d: f64,
}

impl Trapezoidal {
    /// # Errors
    /// - `InvalidShapeFactor` if `d` is outside `[0, 1]`.
    /// - `InvalidParameters` if `hlim` is negative or not finite.
    pub fn new(hlim: f64, d: f64) -> Result<Self> {
        Ok(Self {
            hlim: check_non_negative("half-width", hlim)?,
            d: check_shape_factor(d)?,
        })
    }

    pub fn hlim(&self) -> f64 {
        self.hlim
    }

    /// Shape factor `d`.
    pub fn d(&self) -> f64 {
        self.d
    }

    pub fn set_shape_factor(&mut self, d: f64) -> Result<()> {
        self.d = check_shape_factor(d)?;
        Ok(())
    }

    pub fn set_half_width(&mut self, hlim: f64) -> Result<()> {
        self.hlim = check_non_negative("half-width", hlim)?;
        Ok(())
    }

    /// `u² = ((b − a)² / 24) · (1 + d²)`.
    pub fn standard_uncertainty(&self) -> f64 {
        let span = 2.0 * self.hlim;
        (span * span / 24.0 * (1.0 + self.d * self.d)).sqrt()
    }

    pub(crate) fn sample<R: Rng + ?Sized>(&self, rng: &mut R, count: usize, value: f64) -> Vec<f64> {
        random::trapezoidal(rng, count, value - self.hlim, value + self.hlim, self.d)
    }
}

fn check_shape_factor(d: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&d) {
        Ok(d)
    } else {
        Err(UncertaintyError::InvalidShapeFactor(d))
    }
}

// ============================================================================
// Student-t
// ============================================================================

/// Scaled and shifted Student-t distribution stated by an expanded
/// uncertainty `U` and degrees of freedom `df`.
///
/// Sampling uses the effective spread `σ = u·√(df − 1)` with the mean-of-n
/// Student-t primitive ([`random::student_t`]) at `n = df`.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentT {
    uexp: f64,
    df: f64,
}

impl StudentT {
    /// # Errors
    /// `InvalidParameters` if `uexp` is negative, or `df ≤ 1`, or either is
    /// not finite.
    pub fn new(uexp: f64, df: f64) -> Result<Self> {
        let df = check_finite("degrees of freedom", df)?;
        if df <= 1.0 {
            return Err(UncertaintyError::InvalidParameters(format!(
                "Student-t requires df > 1, got {df}"
            )));
        }
        Ok(Self {
            uexp: check_non_negative("expanded uncertainty", uexp)?,
            df,
        })
    }

    pub fn uexp(&self) -> f64 {
        self.uexp
    }

    /// Degrees of freedom.
    pub fn df(&self) -> f64 {
        self.df
    }

    /// `u = U / k`, failing with `InvalidCoverage` for `k = 0`.
    pub fn standard_uncertainty(&self, k: f64) -> Result<f64> {
        unexpand(self.uexp, k)
    }

    /// Effective spread `σ = u·√(df − 1)`.
    pub fn spread(&self, k: f64) -> Result<f64> {
        Ok(self.standard_uncertainty(k)? * (self.df - 1.0).sqrt())
    }

    pub(crate) fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        value: f64,
        k: f64,
    ) -> Result<Vec<f64>> {
        random::student_t(rng, count, self.df, value, self.spread(k)?)
    }
}

// ============================================================================
// Unspecified
// ============================================================================

/// Degenerate fallback with no distribution attached.
///
/// Its standard uncertainty is whatever the caller supplied, possibly
/// nothing. Sampling yields a constant set at the nominal value, which is
/// how fixed constants enter a measurement equation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Unspecified {
    ustd: Option<f64>,
}

impl Unspecified {
    /// # Errors
    /// `InvalidParameters` if a supplied `ustd` is negative or not finite.
    pub fn new(ustd: Option<f64>) -> Result<Self> {
        let ustd = ustd
            .map(|u| check_non_negative("standard uncertainty", u))
            .transpose()?;
        Ok(Self { ustd })
    }

    pub fn standard_uncertainty(&self) -> Option<f64> {
        self.ustd
    }

    pub(crate) fn sample(&self, count: usize, value: f64) -> Vec<f64> {
        vec![value; count]
    }
}

// ============================================================================
// Tests
// ============================================================================
