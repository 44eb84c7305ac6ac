//! Monte Carlo run configuration.

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, UncertaintyError};
use crate::random;

/// Number of draws and optional seed for a Monte Carlo evaluation.
///
/// Deserializes from partial input; missing fields take their defaults.
///
/// # Examples
/// ```
/// use u_metrology::MonteCarloConfig;
/// let config = MonteCarloConfig::for_coverage(0.95).unwrap();
/// assert_eq!(config.draws, 200_000);
/// assert_eq!(config.seed, None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    #[serde(default = "default_draws")]
    pub draws: usize,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_draws() -> usize {
    1_000_000
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            draws: default_draws(),
            seed: None,
        }
    }
}

impl MonteCarloConfig {
    /// Draw count recommended for a coverage probability `p`:
    /// `N = ⌈10⁴ / (1 − p)⌉` (JCGM 101:2008, §7.2.2).
    ///
    /// # Errors
    /// `InvalidCoverage` unless `p` lies in `(0, 1)`.
    pub fn for_coverage(coverage: f64) -> Result<Self> {
        if !(coverage.is_finite() && coverage > 0.0 && coverage < 1.0) {
            return Err(UncertaintyError::InvalidCoverage(format!(
                "coverage probability must lie in (0, 1), got {coverage}"
            )));
        }
        // 1e4/(1−p) is not exact in binary; trim rounding noise before ceil
        let draws = (1e4 / (1.0 - coverage) - 1e-6).ceil() as usize;
        Ok(Self { draws, seed: None })
    }

    /// Sets a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Random source for this run: seeded when `seed` is set, otherwise
    /// from operating-system entropy.
    pub fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => random::create_rng(seed),
            None => random::entropy_rng(),
        }
    }
}
