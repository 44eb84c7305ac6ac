//! Coverage probability and coverage factor.
//!
//! A [`CoverageSpec`] always holds a consistent `(coverage, k)` pair. It is
//! built from exactly one of the two values and derives the other:
//!
//! | Given | Derived |
//! |---|---|
//! | coverage `p` | `k = Φ⁻¹(p)` (one-sided standard normal quantile) |
//! | factor `k` | `p = 1 − φ(k)` (standard normal **density**) |
//!
//! The reverse mapping is not the inverse of the forward one: `Φ⁻¹(1 − φ(k))`
//! differs from `k`. Stored records and existing results depend on this
//! relation, so it is kept as is and tested as written.

use std::fmt;

use tracing::warn;

use crate::error::{Result, UncertaintyError};
use crate::special;

/// Coverage probability used when neither value is supplied.
pub const DEFAULT_COVERAGE: f64 = 0.95;

/// Agreement required between a supplied `(coverage, k)` pair and either
/// mapping before both are accepted together.
const PAIR_TOLERANCE: f64 = 1e-9;

/// Coverage probability together with its coverage factor.
///
/// # Examples
/// ```
/// use u_metrology::CoverageSpec;
/// let spec = CoverageSpec::from_coverage(0.975).unwrap();
/// assert!((spec.k() - 1.959963984540054).abs() < 1e-8);
///
/// let spec = CoverageSpec::from_factor(2.0).unwrap();
/// assert!((spec.coverage() - 0.946009033486812).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageSpec {
    coverage: f64,
    k: f64,
}

impl CoverageSpec {
    /// Builds the pair from a coverage probability, `k = Φ⁻¹(p)`.
    ///
    /// # Errors
    /// `InvalidCoverage` unless `p` lies in the open interval `(0, 1)`.
    pub fn from_coverage(coverage: f64) -> Result<Self> {
        Ok(Self {
            coverage: check_probability(coverage)?,
            k: special::normal_quantile(coverage),
        })
    }

    /// Builds the pair from a coverage factor, `p = 1 − φ(k)`.
    ///
    /// # Errors
    /// `InvalidCoverage` if `k` is not finite.
    pub fn from_factor(k: f64) -> Result<Self> {
        Ok(Self {
            coverage: 1.0 - special::normal_density(check_factor(k)?),
            k,
        })
    }

    /// Resolves optional inputs the way constructors receive them.
    ///
    /// - only `coverage` → [`from_coverage`](Self::from_coverage)
    /// - only `k` → [`from_factor`](Self::from_factor)
    /// - neither → the [`DEFAULT_COVERAGE`] of 0.95
    /// - both → accepted only if they agree under one of the two mappings
    ///
    /// # Errors
    /// `InvalidCoverage` for out-of-range values or a disagreeing pair.
    pub fn resolve(coverage: Option<f64>, k: Option<f64>) -> Result<Self> {
        match (coverage, k) {
            (Some(p), None) => Self::from_coverage(p),
            (None, Some(k)) => Self::from_factor(k),
            (None, None) => Ok(Self::default()),
            (Some(p), Some(k)) => {
                let p = check_probability(p)?;
                let k = check_factor(k)?;
                let forward =
                    (special::normal_quantile(p) - k).abs() <= PAIR_TOLERANCE * k.abs().max(1.0);
                let reverse =
                    (1.0 - special::normal_density(k) - p).abs() <= PAIR_TOLERANCE;
                if forward || reverse {
                    Ok(Self { coverage: p, k })
                } else {
                    Err(UncertaintyError::InvalidCoverage(format!(
                        "coverage {p} and coverage factor {k} are inconsistent"
                    )))
                }
            }
        }
    }

    pub fn coverage(&self) -> f64 {
        self.coverage
    }

    /// Coverage factor `k`.
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Replaces the coverage probability and recomputes `k`.
    pub fn set_coverage(&mut self, coverage: f64) -> Result<()> {
        *self = Self::from_coverage(coverage)?;
        Ok(())
    }

    /// Replaces the coverage factor and recomputes the coverage probability.
    pub fn set_k(&mut self, k: f64) -> Result<()> {
        *self = Self::from_factor(k)?;
        Ok(())
    }
}

/// The [`DEFAULT_COVERAGE`] pair. Every use is logged at warn level.
impl Default for CoverageSpec {
    fn default() -> Self {
        warn!(
            coverage = DEFAULT_COVERAGE,
            "no coverage or coverage factor given, using default coverage"
        );
        Self {
            coverage: DEFAULT_COVERAGE,
            k: special::normal_quantile(DEFAULT_COVERAGE),
        }
    }
}

impl fmt::Display for CoverageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p = {:.4} (k = {:.3})", self.coverage, self.k)
    }
}

fn check_probability(p: f64) -> Result<f64> {
    if p.is_finite() && p > 0.0 && p < 1.0 {
        Ok(p)
    } else {
        Err(UncertaintyError::InvalidCoverage(format!(
            "coverage probability must lie in (0, 1), got {p}"
        )))
    }
}

fn check_factor(k: f64) -> Result<f64> {
    if k.is_finite() {
        Ok(k)
    } else {
        Err(UncertaintyError::InvalidCoverage(format!(
            "coverage factor must be finite, got {k}"
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uncertainty::Uncertainty;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_default_is_95_percent() {
        let spec = CoverageSpec::default();
        assert_eq!(spec.coverage(), 0.95);
        assert!((spec.k() - 1.6448536269514722).abs() < 1e-8);
        assert_eq!(CoverageSpec::resolve(None, None).unwrap(), spec);
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn warnings_during(f: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_default_coverage_is_logged_on_every_path() {
        let resolved = warnings_during(|| {
            CoverageSpec::resolve(None, None).unwrap();
        });
        assert!(resolved.contains("using default coverage"), "log: {resolved}");

        let typed = warnings_during(|| {
            Uncertainty::rectangular(1.0, 0.1, CoverageSpec::default()).unwrap();
        });
        assert!(typed.contains("using default coverage"), "log: {typed}");

        let explicit = warnings_during(|| {
            CoverageSpec::resolve(Some(0.9), None).unwrap();
        });
        assert!(explicit.is_empty(), "log: {explicit}");
    }

    #[test]
    fn test_from_coverage_uses_quantile() {
        let spec = CoverageSpec::from_coverage(0.99).unwrap();
        assert_eq!(spec.coverage(), 0.99);
        assert!((spec.k() - 2.3263478740408408).abs() < 1e-8);
    }

    #[test]
    fn test_from_factor_uses_density() {
        // 1 − φ(3) = 1 − 0.00443184841193801
        let spec = CoverageSpec::from_factor(3.0).unwrap();
        assert_eq!(spec.k(), 3.0);
        assert!((spec.coverage() - 0.995568151588062).abs() < 1e-14);
    }

    #[test]
    fn test_reverse_mapping_is_not_the_inverse() {
        let spec = CoverageSpec::from_factor(3.0).unwrap();
        let back = CoverageSpec::from_coverage(spec.coverage()).unwrap();
        // Φ⁻¹(0.99557) ≈ 2.617, not 3
        assert!((back.k() - 2.617).abs() < 1e-3, "k = {}", back.k());
    }

    #[test]
    fn test_invalid_probabilities() {
        for p in [0.0, 1.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    CoverageSpec::from_coverage(p),
                    Err(UncertaintyError::InvalidCoverage(_))
                ),
                "p = {p} accepted"
            );
        }
        assert!(CoverageSpec::from_factor(f64::NAN).is_err());
    }

    #[test]
    fn test_resolve_single_inputs() {
        assert_eq!(
            CoverageSpec::resolve(Some(0.9), None).unwrap(),
            CoverageSpec::from_coverage(0.9).unwrap()
        );
        assert_eq!(
            CoverageSpec::resolve(None, Some(2.0)).unwrap(),
            CoverageSpec::from_factor(2.0).unwrap()
        );
    }

    #[test]
    fn test_resolve_consistent_pairs() {
        let forward = CoverageSpec::from_coverage(0.95).unwrap();
        assert_eq!(
            CoverageSpec::resolve(Some(forward.coverage()), Some(forward.k())).unwrap(),
            forward
        );
        let reverse = CoverageSpec::from_factor(3.0).unwrap();
        assert_eq!(
            CoverageSpec::resolve(Some(reverse.coverage()), Some(reverse.k())).unwrap(),
            reverse
        );
    }

    #[test]
    fn test_resolve_inconsistent_pair() {
        let err = CoverageSpec::resolve(Some(0.95), Some(3.0)).unwrap_err();
        assert!(matches!(err, UncertaintyError::InvalidCoverage(_)));
    }

    #[test]
    fn test_setters_keep_pair_consistent() {
        let mut spec = CoverageSpec::default();
        spec.set_k(2.0).unwrap();
        assert_eq!(spec, CoverageSpec::from_factor(2.0).unwrap());
        spec.set_coverage(0.99).unwrap();
        assert_eq!(spec, CoverageSpec::from_coverage(0.99).unwrap());
        assert!(spec.set_coverage(1.0).is_err());
        // failed update leaves the pair untouched
        assert_eq!(spec.coverage(), 0.99);
    }

    #[test]
    fn test_display() {
        let spec = CoverageSpec::from_coverage(0.95).unwrap();
        assert_eq!(spec.to_string(), "p = 0.9500 (k = 1.645)");
    }
}
