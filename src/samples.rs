//! Monte Carlo sample sets and elementwise propagation.
//!
//! A measurement equation is evaluated by drawing the same number of values
//! from every input quantity and combining the sets elementwise. Each result
//! is a new [`MonteCarloSampleSet`] whose mean and standard deviation
//! (`ddof = 1`) are recomputed from its values. Labels, unit and coverage
//! are taken from the left operand.
//!
//! Results follow IEEE arithmetic: an overflowing product or a quotient by a
//! subnormal divisor yields infinite values instead of an error, and the
//! statistics of such a set are NaN or infinite. Only an exact zero divisor
//! fails.
//!
//! ```
//! use u_metrology::{random::create_rng, CoverageSpec, Uncertainty};
//! let cov = CoverageSpec::from_factor(2.0).unwrap();
//! let a = Uncertainty::normal(10.0, 0.2, cov).unwrap();
//! let b = Uncertainty::rectangular(5.0, 0.1, cov).unwrap();
//! let mut rng = create_rng(42);
//! let sa = a.sample_with(Some(10_000), &mut rng).unwrap();
//! let sb = b.sample_with(Some(10_000), &mut rng).unwrap();
//! let sum = sa.try_add(sb).unwrap().try_mul(2.0).unwrap();
//! assert!((sum.mean() - 30.0).abs() < 0.05);
//! ```

use std::fmt;

use crate::coverage::CoverageSpec;
use crate::error::{Result, UncertaintyError};
use crate::stats;
use crate::uncertainty::{Uncertainty, DEFAULT_UNIT};

/// Right-hand side of an elementwise operation.
#[derive(Debug, Clone, Copy)]
pub enum Operand<'a> {
    /// Broadcast to every element.
    Scalar(f64),
    /// Combined index by index; lengths must match.
    Samples(&'a MonteCarloSampleSet),
}

impl From<f64> for Operand<'_> {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl<'a> From<&'a MonteCarloSampleSet> for Operand<'a> {
    fn from(set: &'a MonteCarloSampleSet) -> Self {
        Self::Samples(set)
    }
}

impl Operand<'_> {
    fn at(&self, index: usize) -> f64 {
        match self {
            Self::Scalar(x) => *x,
            Self::Samples(set) => set.values[index],
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
        }
    }
}

/// Draws of one quantity plus their summary statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloSampleSet {
    values: Vec<f64>,
    coverage: CoverageSpec,
    unit: String,
    definition: Option<String>,
    description: Option<String>,
    mean: f64,
    std_dev: f64,
}

impl MonteCarloSampleSet {
    /// A set of one value has an undefined (NaN) standard deviation.
    ///
    /// # Errors
    /// `InvalidParameters` if `values` is empty or holds a NaN or infinite
    /// value.
    pub fn new(values: Vec<f64>, coverage: CoverageSpec) -> Result<Self> {
        if values.is_empty() {
            return Err(UncertaintyError::InvalidParameters(
                "a sample set needs at least one value".into(),
            ));
        }
        if values.iter().any(|x| !x.is_finite()) {
            return Err(UncertaintyError::InvalidParameters(
                "sample set contains non-finite values".into(),
            ));
        }
        Ok(Self::from_values(values, coverage))
    }

    /// Unchecked counterpart of [`new`](Self::new) for arithmetic results.
    /// `values` must not be empty.
    fn from_values(values: Vec<f64>, coverage: CoverageSpec) -> Self {
        let (mean, std_dev) = match stats::Summary::of(&values) {
            Some(summary) => (summary.mean, summary.std_dev),
            // a single value or non-finite values
            None => (values.iter().sum::<f64>() / values.len() as f64, f64::NAN),
        };
        Self {
            values,
            coverage,
            unit: DEFAULT_UNIT.to_string(),
            definition: None,
            description: None,
            mean,
            std_dev,
        }
    }

    /// `count` copies of `value`.
    pub fn constant(value: f64, count: usize, coverage: CoverageSpec) -> Result<Self> {
        Self::new(vec![value; count], coverage)
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

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation (`ddof = 1`).
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Standard uncertainty of the output quantity, the sample standard deviation.
    pub fn standard_uncertainty(&self) -> f64 {
        self.std_dev
    }

    /// `k · std_dev` with the set's coverage factor.
    pub fn expanded_uncertainty(&self) -> f64 {
        self.coverage.k() * self.std_dev
    }

    pub fn coverage(&self) -> CoverageSpec {
        self.coverage
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

    pub fn set_coverage(&mut self, coverage: CoverageSpec) {
        self.coverage = coverage;
    }

    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
    }

    pub fn set_definition(&mut self, definition: Option<String>) {
        self.definition = definition;
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Probabilistically symmetric coverage interval
    /// `[q((1 − p)/2), q((1 + p)/2)]` from the empirical quantiles.
    pub fn coverage_interval(&self) -> Option<(f64, f64)> {
        stats::symmetric_interval(&self.values, self.coverage.coverage())
    }

    /// Summarizes the set as a degenerate [`Uncertainty`] with the set's
    /// mean, standard deviation, coverage and labels.
    ///
    /// # Errors
    /// `InvalidParameters` if the mean or standard deviation is not finite.
    pub fn to_uncertainty(&self) -> Result<Uncertainty> {
        let mut u = Uncertainty::with_standard_uncertainty(self.mean, self.std_dev, self.coverage)?
            .with_unit(self.unit.clone());
        u.set_definition(self.definition.clone());
        u.set_description(self.description.clone());
        Ok(u)
    }

    // --- elementwise arithmetic ---------------------------------------------

    /// `self + rhs`.
    ///
    /// # Errors
    /// `LengthMismatch` if `rhs` is a set of a different length.
    pub fn try_add<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Self> {
        self.combine(rhs.into(), BinaryOp::Add)
    }

    /// `self − rhs`.
    pub fn try_sub<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Self> {
        self.combine(rhs.into(), BinaryOp::Sub)
    }

    /// `self · rhs`.
    pub fn try_mul<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Self> {
        self.combine(rhs.into(), BinaryOp::Mul)
    }

    /// `self / rhs`.
    ///
    /// # Errors
    /// - `DivisionByZero` with the first index whose divisor is zero. A zero
    ///   scalar divisor reports index 0.
    /// - `LengthMismatch` if `rhs` is a set of a different length.
    pub fn try_div<'a>(&self, rhs: impl Into<Operand<'a>>) -> Result<Self> {
        let rhs = rhs.into();
        self.check_lengths(&rhs)?;
        let zero = match rhs {
            Operand::Scalar(x) => (x == 0.0).then_some(0),
            Operand::Samples(set) => first_zero(&set.values),
        };
        if let Some(index) = zero {
            return Err(UncertaintyError::DivisionByZero { index });
        }
        self.combine(rhs, BinaryOp::Div)
    }

    /// `scalar − self`.
    pub fn rsub(&self, scalar: f64) -> Self {
        self.map(|x| scalar - x)
    }

    /// `scalar / self`.
    ///
    /// # Errors
    /// `DivisionByZero` with the first index holding a zero.
    pub fn rdiv(&self, scalar: f64) -> Result<Self> {
        if let Some(index) = first_zero(&self.values) {
            return Err(UncertaintyError::DivisionByZero { index });
        }
        Ok(self.map(|x| scalar / x))
    }

    /// Applies `f` to every value, e.g. a nonlinear term of the equation.
    /// NaN or infinite results are kept.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        self.derive(self.values.iter().map(|&x| f(x)).collect())
    }

    fn combine(&self, rhs: Operand<'_>, op: BinaryOp) -> Result<Self> {
        self.check_lengths(&rhs)?;
        let values = self
            .values
            .iter()
            .enumerate()
            .map(|(i, &a)| op.apply(a, rhs.at(i)))
            .collect();
        Ok(self.derive(values))
    }

    fn check_lengths(&self, rhs: &Operand<'_>) -> Result<()> {
        match rhs {
            Operand::Samples(set) if set.len() != self.len() => Err(UncertaintyError::LengthMismatch {
                left: self.len(),
                right: set.len(),
            }),
            _ => Ok(()),
        }
    }

    /// New set over `values` carrying this set's metadata.
    fn derive(&self, values: Vec<f64>) -> Self {
        let mut set = Self::from_values(values, self.coverage).with_unit(self.unit.clone());
        set.definition = self.definition.clone();
        set.description = self.description.clone();
        set
    }
}

fn first_zero(values: &[f64]) -> Option<usize> {
    values.iter().position(|&x| x == 0.0)
}

impl fmt::Display for MonteCarloSampleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MonteCarloSampleSet({:.3e}, ustd {:.3e}, N={})",
            self.mean,
            self.std_dev,
            self.len()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observations::DirectObservations;
    use crate::random::create_rng;

    fn set(values: &[f64]) -> MonteCarloSampleSet {
        MonteCarloSampleSet::new(values.to_vec(), CoverageSpec::default()).unwrap()
    }

    #[test]
    fn test_summary_statistics() {
        let s = set(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.len(), 4);
        assert!(!s.is_empty());
        assert_eq!(s.mean(), 2.5);
        assert!((s.std_dev() - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(s.standard_uncertainty(), s.std_dev());
        assert!((s.expanded_uncertainty() - s.coverage().k() * s.std_dev()).abs() < 1e-15);
    }

    #[test]
    fn test_new_rejects_bad_input() {
        let cov = CoverageSpec::default();
        assert!(MonteCarloSampleSet::new(vec![], cov).is_err());
        assert!(MonteCarloSampleSet::new(vec![1.0, f64::NAN], cov).is_err());
        assert!(MonteCarloSampleSet::constant(3.0, 0, cov).is_err());
        let c = MonteCarloSampleSet::constant(3.0, 10, cov).unwrap();
        assert_eq!(c.std_dev(), 0.0);
    }

    #[test]
    fn test_elementwise_with_sets() {
        let a = set(&[1.0, 2.0, 3.0]);
        let b = set(&[4.0, 5.0, 6.0]);
        assert_eq!(a.try_add(&b).unwrap().values(), &[5.0, 7.0, 9.0]);
        assert_eq!(a.try_sub(&b).unwrap().values(), &[-3.0, -3.0, -3.0]);
        assert_eq!(a.try_mul(&b).unwrap().values(), &[4.0, 10.0, 18.0]);
        assert_eq!(b.try_div(&a).unwrap().values(), &[4.0, 2.5, 2.0]);
    }

    #[test]
    fn test_scalar_broadcast() {
        let a = set(&[1.0, 2.0, 4.0]);
        assert_eq!(a.try_add(1.0).unwrap().values(), &[2.0, 3.0, 5.0]);
        assert_eq!(a.try_sub(1.0).unwrap().values(), &[0.0, 1.0, 3.0]);
        assert_eq!(a.try_mul(2.0).unwrap().values(), &[2.0, 4.0, 8.0]);
        assert_eq!(a.try_div(2.0).unwrap().values(), &[0.5, 1.0, 2.0]);
        assert_eq!(a.rsub(10.0).values(), &[9.0, 8.0, 6.0]);
        assert_eq!(a.rdiv(4.0).unwrap().values(), &[4.0, 2.0, 1.0]);
    }

    #[test]
    fn test_statistics_recomputed() {
        let a = set(&[1.0, 2.0, 3.0, 4.0]);
        let doubled = a.try_mul(2.0).unwrap();
        assert_eq!(doubled.mean(), 5.0);
        assert!((doubled.std_dev() - 2.0 * a.std_dev()).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        let a = set(&[1.0, 2.0, 3.0]);
        let b = set(&[1.0, 2.0]);
        let expected = UncertaintyError::LengthMismatch { left: 3, right: 2 };
        assert_eq!(a.try_add(&b).unwrap_err(), expected);
        assert_eq!(a.try_div(&b).unwrap_err(), expected);
    }

    #[test]
    fn test_division_by_zero() {
        let a = set(&[1.0, 2.0, 3.0]);
        let b = set(&[1.0, 0.0, 3.0]);
        assert_eq!(
            a.try_div(&b).unwrap_err(),
            UncertaintyError::DivisionByZero { index: 1 }
        );
        assert_eq!(
            a.try_div(0.0).unwrap_err(),
            UncertaintyError::DivisionByZero { index: 0 }
        );
        assert_eq!(
            b.rdiv(1.0).unwrap_err(),
            UncertaintyError::DivisionByZero { index: 1 }
        );
        assert!(a.try_div(&set(&[-1.0, 0.5, 3.0])).is_ok());
    }

    #[test]
    fn test_left_operand_metadata_kept() {
        let a = set(&[1.0, 2.0])
            .with_unit("V")
            .with_definition("U")
            .with_description("voltage");
        let mut b = set(&[3.0, 4.0]).with_unit("A").with_definition("I");
        b.set_coverage(CoverageSpec::from_factor(3.0).unwrap());

        let product = a.try_mul(&b).unwrap();
        assert_eq!(product.unit(), "V");
        assert_eq!(product.definition(), Some("U"));
        assert_eq!(product.description(), Some("voltage"));
        assert_eq!(product.coverage(), a.coverage());
    }

    #[test]
    fn test_map() {
        let a = set(&[1.0, 4.0, 9.0]);
        assert_eq!(a.map(f64::sqrt).values(), &[1.0, 2.0, 3.0]);
        let roots = set(&[-1.0, 4.0]).map(f64::sqrt);
        assert!(roots.values()[0].is_nan());
        assert!(roots.mean().is_nan() && roots.std_dev().is_nan());
        assert_eq!(roots.coverage_interval(), None);
        assert!(matches!(
            roots.to_uncertainty(),
            Err(UncertaintyError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_single_value_set() {
        let one = set(&[4.0]);
        assert_eq!(one.len(), 1);
        assert_eq!(one.mean(), 4.0);
        assert!(one.std_dev().is_nan());
        assert_eq!(one.try_mul(2.0).unwrap().values(), &[8.0]);
    }

    #[test]
    fn test_nonzero_divisor_never_fails() {
        let a = set(&[1.0, 2.0, 3.0]);
        let tiny = set(&[1.0, 1e-320, 3.0]);
        let q = a.try_div(&tiny).unwrap();
        assert_eq!(q.values()[0], 1.0);
        assert_eq!(q.values()[1], f64::INFINITY);
        assert_eq!(q.mean(), f64::INFINITY);
        assert!(tiny.rdiv(1.0).unwrap().values()[1].is_infinite());

        let huge = set(&[1e300, 2.0]);
        let product = huge.try_mul(&huge).unwrap();
        assert_eq!(product.values(), &[f64::INFINITY, 4.0]);
        assert!(huge.try_add(f64::MAX).is_ok());
    }

    #[test]
    fn test_coverage_interval() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let s = MonteCarloSampleSet::new(values, CoverageSpec::from_coverage(0.9).unwrap()).unwrap();
        let (low, high) = s.coverage_interval().unwrap();
        assert!((low - 5.0).abs() < 1e-9);
        assert!((high - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_normal_coverage_interval() {
        let u = Uncertainty::normal(0.0, 1.96, CoverageSpec::from_factor(1.96).unwrap()).unwrap();
        let s = u.sample_with(Some(200_000), &mut create_rng(8)).unwrap();
        let (low, high) = s.coverage_interval().unwrap();
        // p = 1 − φ(1.96) ≈ 0.9416, symmetric interval ≈ ±1.892
        assert!((high - 1.892).abs() < 0.03, "high {high}");
        assert!((low + 1.892).abs() < 0.03, "low {low}");
    }

    #[test]
    fn test_to_uncertainty() {
        let s = set(&[1.0, 2.0, 3.0, 4.0]).with_unit("Ohm").with_definition("RX");
        let u = s.to_uncertainty().unwrap();
        assert_eq!(u.value(), 2.5);
        assert_eq!(u.standard_uncertainty().unwrap(), s.std_dev());
        assert_eq!(u.unit(), "Ohm");
        assert_eq!(u.definition(), Some("RX"));
        assert_eq!(u.coverage(), s.coverage());
    }

    #[test]
    fn test_display() {
        let s = set(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.to_string(), "MonteCarloSampleSet(2.500e0, ustd 1.291e0, N=4)");
    }

    #[test]
    fn test_sum_of_independent_inputs() {
        let cov = CoverageSpec::from_factor(2.0).unwrap();
        let a = Uncertainty::normal(10.0, 0.4, cov).unwrap();
        let b = Uncertainty::rectangular(3.0, 0.5, cov).unwrap();
        let mut rng = create_rng(11);
        let n = 200_000;
        let sum = a
            .sample_with(Some(n), &mut rng)
            .unwrap()
            .try_add(b.sample_with(Some(n), &mut rng).unwrap())
            .unwrap();
        assert!((sum.mean() - 13.0).abs() < 0.01);
        let ua = a.standard_uncertainty().unwrap();
        let ub = b.standard_uncertainty().unwrap();
        let expected = (ua * ua + ub * ub).sqrt();
        assert!((sum.std_dev() - expected).abs() / expected < 0.02);
    }

    #[test]
    fn test_rectangular_sum_within_mc_error() {
        let cov = CoverageSpec::default();
        let a = Uncertainty::rectangular(100.0, 0.005, cov).unwrap();
        let b = Uncertainty::rectangular(50.0, 0.5, cov).unwrap();
        let mut rng = create_rng(10);
        let n = 40_000;
        let sum = a
            .sample_with(Some(n), &mut rng)
            .unwrap()
            .try_add(b.sample_with(Some(n), &mut rng).unwrap())
            .unwrap();
        // 5σ of the mean estimate
        let tolerance = 5.0 * sum.std_dev() / (n as f64).sqrt();
        assert!((sum.mean() - 150.0).abs() < tolerance, "mean {}", sum.mean());
    }

    #[test]
    fn test_first_call_size_governs_propagation() {
        let cov = CoverageSpec::default();
        let a = Uncertainty::rectangular(1.0, 0.1, cov).unwrap();
        let b = Uncertainty::rectangular(2.0, 0.1, cov).unwrap();
        let mut rng = create_rng(12);
        a.sample_with(Some(1000), &mut rng).unwrap();
        let sa = a.sample_with(Some(5000), &mut rng).unwrap();
        let sb = b.sample_with(Some(5000), &mut rng).unwrap();
        assert_eq!(sa.len(), 1000);
        assert_eq!(
            sa.try_add(sb).unwrap_err(),
            UncertaintyError::LengthMismatch { left: 1000, right: 5000 }
        );
    }

    /// Bridge balance `RX = R21·R22/R23 − RZ + RO + RCONT·RL` with a Type A
    /// correction.
    #[test]
    fn test_bridge_equation() {
        let cov = CoverageSpec::from_factor(2.0).unwrap();
        let r21 = Uncertainty::rectangular(100.0, 0.005, cov).unwrap();
        let r22 = Uncertainty::rectangular(100.0, 0.005, cov).unwrap();
        let r23 = Uncertainty::normal(100.0, 0.01, cov).unwrap();
        let rz = Uncertainty::triangular(0.01, 0.002, cov).unwrap();
        let ro = Uncertainty::constant(0.105, cov).unwrap();
        let obs = DirectObservations::new(vec![1.0e-3, 1.2e-3, 0.9e-3, 1.1e-3, 1.0e-3]).unwrap();
        let rcont = Uncertainty::direct_observations(obs, cov).unwrap();
        let rl = Uncertainty::trapezoidal(2.0, 0.1, 0.5, cov).unwrap();

        let mut rng = create_rng(2024);
        let n = Some(100_000);
        let rx = r21
            .sample_with(n, &mut rng)
            .unwrap()
            .try_mul(r22.sample_with(n, &mut rng).unwrap())
            .unwrap()
            .try_div(r23.sample_with(n, &mut rng).unwrap())
            .unwrap()
            .try_sub(rz.sample_with(n, &mut rng).unwrap())
            .unwrap()
            .try_add(ro.sample_with(n, &mut rng).unwrap())
            .unwrap()
            .try_add(
                &rcont
                    .sample_with(n, &mut rng)
                    .unwrap()
                    .try_mul(rl.sample_with(n, &mut rng).unwrap())
                    .unwrap(),
            )
            .unwrap();

        assert_eq!(rx.len(), 100_000);
        let nominal = 100.0 * 100.0 / 100.0 - 0.01 + 0.105 + 1.04e-3 * 2.0;
        assert!((rx.mean() - nominal).abs() < 1e-3, "mean {}", rx.mean());
        assert!(rx.std_dev() > 0.0 && rx.std_dev() < 0.02);
        assert_eq!(rx.coverage(), cov);
    }
}
