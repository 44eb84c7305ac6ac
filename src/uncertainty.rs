//! Input quantities with an attached uncertainty distribution.
//!
//! An [`Uncertainty`] holds the nominal value, labels, coverage and one
//! [`Distribution`] payload. Standard and expanded uncertainty are derived
//! from the payload and the current coverage factor on every call, so
//! `uexp = k · ustd` holds whatever the coverage is set to.
//!
//! The first sampling request materializes a [`MonteCarloSampleSet`] and
//! caches it for the lifetime of the instance. Later requests return the
//! cached set and ignore the requested size: the first call decides `N`.
//! A different `N` needs a new instance.

use std::cell::OnceCell;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use tracing::debug;

use crate::config::MonteCarloConfig;
use crate::coverage::CoverageSpec;
use crate::distributions::{Normal, Rectangular, StudentT, Trapezoidal, Triangular, Unspecified};
use crate::error::{Result, UncertaintyError};
use crate::observations::DirectObservations;
use crate::samples::MonteCarloSampleSet;

/// Unit assigned when none is given (dimensionless).
pub const DEFAULT_UNIT: &str = "1";

// ============================================================================
// Kind tags
// ============================================================================

/// How the uncertainty was evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Statistical analysis of repeated observations.
    TypeA,
    /// Other means, such as calibration certificates or manufacturer data.
    TypeB,
    /// Degenerate quantity without an evaluation.
    Unspecified,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeA => "Type A",
            Self::TypeB => "Type B",
            Self::Unspecified => "None",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of distribution tags, used for dispatch and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionKind {
    None,
    Normal,
    Rectangular,
    Triangular,
    Trapezoidal,
    StudentT,
    DirectObservations,
}

impl DistributionKind {
    pub const ALL: [DistributionKind; 7] = [
        Self::None,
        Self::Normal,
        Self::Rectangular,
        Self::Triangular,
        Self::Trapezoidal,
        Self::StudentT,
        Self::DirectObservations,
    ];

    /// The tag written to records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Normal => "Normal",
            Self::Rectangular => "Rectangular",
            Self::Triangular => "Triangular",
            Self::Trapezoidal => "Trapezoidal",
            Self::StudentT => "StudentT",
            Self::DirectObservations => "Direct Observation",
        }
    }

    pub fn classification(&self) -> Classification {
        match self {
            Self::None => Classification::Unspecified,
            Self::DirectObservations => Classification::TypeA,
            Self::Normal | Self::Rectangular | Self::Triangular | Self::Trapezoidal | Self::StudentT => {
                Classification::TypeB
            }
        }
    }
}

impl FromStr for DistributionKind {
    type Err = UncertaintyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UncertaintyError::UnknownDistributionKind(s.to_string()))
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Distribution payload
// ============================================================================

/// Distribution attached to an input quantity, one variant per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    None(Unspecified),
    Normal(Normal),
    Rectangular(Rectangular),
    Triangular(Triangular),
    Trapezoidal(Trapezoidal),
    StudentT(StudentT),
    DirectObservations(DirectObservations),
}

impl Distribution {
    pub fn kind(&self) -> DistributionKind {
        match self {
            Self::None(_) => DistributionKind::None,
            Self::Normal(_) => DistributionKind::Normal,
            Self::Rectangular(_) => DistributionKind::Rectangular,
            Self::Triangular(_) => DistributionKind::Triangular,
            Self::Trapezoidal(_) => DistributionKind::Trapezoidal,
            Self::StudentT(_) => DistributionKind::StudentT,
            Self::DirectObservations(_) => DistributionKind::DirectObservations,
        }
    }

    /// Half-width of the limits for the bounded kinds.
    pub fn hlim(&self) -> Option<f64> {
        match self {
            Self::Rectangular(r) => Some(r.hlim()),
            Self::Triangular(t) => Some(t.hlim()),
            Self::Trapezoidal(t) => Some(t.hlim()),
            _ => None,
        }
    }
}

// ============================================================================
// Uncertainty
// ============================================================================

/// An input quantity: nominal value, labels, coverage and distribution.
///
/// # Examples
/// ```
/// use u_metrology::{CoverageSpec, Uncertainty};
/// let r = Uncertainty::rectangular(100.0, 0.005, CoverageSpec::default()).unwrap();
/// assert_eq!(r.limits(), Some((99.995, 100.005)));
/// assert!((r.standard_uncertainty().unwrap() - 0.0028867513).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Uncertainty {
    value: f64,
    unit: String,
    definition: Option<String>,
    description: Option<String>,
    coverage: CoverageSpec,
    distribution: Distribution,
    samples: OnceCell<MonteCarloSampleSet>,
}

impl Uncertainty {
    pub(crate) fn from_distribution(
        value: f64,
        distribution: Distribution,
        coverage: CoverageSpec,
    ) -> Result<Self> {
        if !value.is_finite() {
            return Err(UncertaintyError::InvalidParameters(format!(
                "nominal value must be finite, got {value}"
            )));
        }
        Ok(Self {
            value,
            unit: DEFAULT_UNIT.to_string(),
            definition: None,
            description: None,
            coverage,
            distribution,
            samples: OnceCell::new(),
        })
    }

    /// Degenerate quantity without a standard uncertainty.
    ///
    /// Sampling gives a constant set; the uncertainty accessors fail with
    /// `UninitializedUncertainty`.
    pub fn constant(value: f64, coverage: CoverageSpec) -> Result<Self> {
        Self::from_distribution(value, Distribution::None(Unspecified::default()), coverage)
    }

    /// Degenerate quantity with a stated standard uncertainty.
    pub fn with_standard_uncertainty(value: f64, ustd: f64, coverage: CoverageSpec) -> Result<Self> {
        let payload = Unspecified::new(Some(ustd))?;
        Self::from_distribution(value, Distribution::None(payload), coverage)
    }

    /// Normal distribution from an expanded uncertainty `U` at `coverage`.
    pub fn normal(value: f64, uexp: f64, coverage: CoverageSpec) -> Result<Self> {
        Self::from_distribution(value, Distribution::Normal(Normal::new(uexp)?), coverage)
    }

    /// Rectangular distribution on `[value − hlim, value + hlim]`.
    pub fn rectangular(value: f64, hlim: f64, coverage: CoverageSpec) -> Result<Self> {
        let payload = Rectangular::new(hlim)?;
        Self::from_distribution(value, Distribution::Rectangular(payload), coverage)
    }

    /// Symmetric triangular distribution on `[value − hlim, value + hlim]`.
    pub fn triangular(value: f64, hlim: f64, coverage: CoverageSpec) -> Result<Self> {
        let payload = Triangular::new(hlim)?;
        Self::from_distribution(value, Distribution::Triangular(payload), coverage)
    }

    /// Trapezoidal distribution with shape factor `d ∈ [0, 1]`.
    pub fn trapezoidal(value: f64, hlim: f64, d: f64, coverage: CoverageSpec) -> Result<Self> {
        let payload = Trapezoidal::new(hlim, d)?;
        Self::from_distribution(value, Distribution::Trapezoidal(payload), coverage)
    }

    /// Student-t distribution from an expanded uncertainty and degrees of freedom.
    pub fn student_t(value: f64, uexp: f64, df: f64, coverage: CoverageSpec) -> Result<Self> {
        let payload = StudentT::new(uexp, df)?;
        Self::from_distribution(value, Distribution::StudentT(payload), coverage)
    }

    /// Type A quantity; the nominal value is the mean of the observations.
    pub fn direct_observations(observations: DirectObservations, coverage: CoverageSpec) -> Result<Self> {
        let value = observations.mean();
        Self::from_distribution(value, Distribution::DirectObservations(observations), coverage)
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    // --- accessors -----------------------------------------------------------

    /// Nominal value.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn coverage(&self) -> CoverageSpec {
        self.coverage
    }

    /// Coverage factor `k`.
    pub fn k(&self) -> f64 {
        self.coverage.k()
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn kind(&self) -> DistributionKind {
        self.distribution.kind()
    }

    pub fn classification(&self) -> Classification {
        self.kind().classification()
    }

    /// `(value − hlim, value + hlim)` for the bounded kinds.
    pub fn limits(&self) -> Option<(f64, f64)> {
        self.distribution
            .hlim()
            .map(|hlim| (self.value - hlim, self.value + hlim))
    }

    /// Mutable access to a trapezoidal payload. Changes do not affect an
    /// already cached sample set.
    pub fn as_trapezoidal_mut(&mut self) -> Option<&mut Trapezoidal> {
        match &mut self.distribution {
            Distribution::Trapezoidal(t) => Some(t),
            _ => None,
        }
    }

    // --- mutators ------------------------------------------------------------

    pub fn set_definition(&mut self, definition: Option<String>) {
        self.definition = definition;
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Replaces the coverage. `ustd` and `uexp` follow the new `k`; an
    /// already cached sample set keeps the coverage it was drawn with.
    pub fn set_coverage(&mut self, coverage: CoverageSpec) {
        self.coverage = coverage;
    }

    // --- GUM formulas --------------------------------------------------------

    /// Standard uncertainty `u(x)` for the attached distribution.
    ///
    /// # Errors
    /// - `UninitializedUncertainty` for a degenerate quantity without one.
    /// - `InvalidCoverage` for a Normal or Student-t quantity at `k = 0`
    ///   (coverage 0.5), where `U / k` is undefined.
    pub fn standard_uncertainty(&self) -> Result<f64> {
        let k = self.k();
        match &self.distribution {
            Distribution::None(u) => u
                .standard_uncertainty()
                .ok_or(UncertaintyError::UninitializedUncertainty),
            Distribution::Normal(n) => n.standard_uncertainty(k),
            Distribution::Rectangular(r) => Ok(r.standard_uncertainty()),
            Distribution::Triangular(t) => Ok(t.standard_uncertainty()),
            Distribution::Trapezoidal(t) => Ok(t.standard_uncertainty()),
            Distribution::StudentT(t) => t.standard_uncertainty(k),
            Distribution::DirectObservations(o) => Ok(o.standard_uncertainty()),
        }
    }

    /// Expanded uncertainty `U = k · u(x)`.
    ///
    /// # Errors
    /// `UninitializedUncertainty` for a degenerate quantity without `u(x)`.
    pub fn expanded_uncertainty(&self) -> Result<f64> {
        Ok(self.k() * self.standard_uncertainty()?)
    }

    // --- Monte Carlo ---------------------------------------------------------

    /// The cached sample set, if one has been drawn.
    pub fn samples(&self) -> Option<&MonteCarloSampleSet> {
        self.samples.get()
    }

    /// Returns the sample set, drawing `draws` values from the thread-local
    /// generator on the first call.
    ///
    /// # Errors
    /// - `SamplingState` if nothing is cached and `draws` is `None`.
    /// - `InvalidParameters` if zero draws are requested. A single draw is
    ///   allowed; its set has a NaN standard deviation.
    pub fn sample(&self, draws: Option<usize>) -> Result<&MonteCarloSampleSet> {
        self.sample_with(draws, &mut rand::rng())
    }

    /// Like [`sample`](Self::sample), drawing from the given generator.
    ///
    /// # Examples
    /// ```
    /// use u_metrology::{random::create_rng, CoverageSpec, Uncertainty};
    /// let u = Uncertainty::rectangular(10.0, 0.5, CoverageSpec::default()).unwrap();
    /// let mut rng = create_rng(7);
    /// assert_eq!(u.sample_with(Some(1000), &mut rng).unwrap().len(), 1000);
    /// // cached: the second size is ignored
    /// assert_eq!(u.sample_with(Some(5000), &mut rng).unwrap().len(), 1000);
    /// ```
    pub fn sample_with<R: Rng + ?Sized>(
        &self,
        draws: Option<usize>,
        rng: &mut R,
    ) -> Result<&MonteCarloSampleSet> {
        if let Some(cached) = self.samples.get() {
            if let Some(requested) = draws.filter(|&n| n != cached.len()) {
                debug!(
                    kind = %self.kind(),
                    cached = cached.len(),
                    requested,
                    "reusing cached sample set, requested size ignored"
                );
            }
            return Ok(cached);
        }

        let count = draws.ok_or(UncertaintyError::SamplingState)?;
        let values = self.draw(rng, count)?;
        let mut set = MonteCarloSampleSet::new(values, self.coverage)?.with_unit(self.unit.clone());
        set.set_definition(self.definition.clone());
        set.set_description(self.description.clone());
        debug!(kind = %self.kind(), draws = count, "materialized sample set");
        Ok(self.samples.get_or_init(|| set))
    }

    /// Samples with the draw count and random source of `config`.
    pub fn sample_with_config(&self, config: &MonteCarloConfig) -> Result<&MonteCarloSampleSet> {
        self.sample_with(Some(config.draws), &mut config.rng())
    }

    fn draw<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Result<Vec<f64>> {
        let (value, k) = (self.value, self.k());
        match &self.distribution {
            Distribution::None(u) => Ok(u.sample(count, value)),
            Distribution::Normal(n) => n.sample(rng, count, value, k),
            Distribution::Rectangular(r) => Ok(r.sample(rng, count, value)),
            Distribution::Triangular(t) => Ok(t.sample(rng, count, value)),
            Distribution::Trapezoidal(t) => Ok(t.sample(rng, count, value)),
            Distribution::StudentT(t) => t.sample(rng, count, value, k),
            Distribution::DirectObservations(o) => o.sample(rng, count),
        }
    }
}

impl fmt::Display for Uncertainty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(definition) = self.definition().filter(|d| !d.is_empty()) {
            write!(f, "{definition} = ")?;
        }
        write!(f, "{:.3e}", self.value)?;
        if let Ok(uexp) = self.expanded_uncertainty() {
            write!(f, " ± {uexp:.3e}")?;
        }
        if !self.unit.is_empty() && self.unit != DEFAULT_UNIT {
            write!(f, " {}", self.unit)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
