//! # u-metrology
//!
//! Measurement uncertainty evaluation following the GUM (JCGM 100:2008) and
//! its Monte Carlo supplement (JCGM 101:2008).
//!
//! Input quantities are described by a nominal value and a probability
//! distribution. Type A quantities come from repeated observations, Type B
//! quantities from stated limits or expanded uncertainties. Each quantity
//! reports its standard and expanded uncertainty and can draw a
//! [`MonteCarloSampleSet`]. Sample sets of equal size are combined
//! elementwise to propagate distributions through a measurement equation.
//!
//! ## Modules
//!
//! - [`coverage`]: coverage probability / coverage factor pairs
//! - [`distributions`]: Type B distribution payloads and their GUM formulas
//! - [`observations`]: Type A evaluation of repeated observations
//! - [`uncertainty`]: input quantities with a cached sample set
//! - [`samples`]: sample sets and elementwise propagation
//! - [`record`]: flat key/value persistence
//! - [`config`]: Monte Carlo draw count and seed
//! - [`random`]: seeded generators and sampling primitives
//! - [`stats`]: descriptive statistics with numerical stability guarantees
//! - [`special`]: normal distribution functions
//!
//! ## Example
//!
//! ```
//! use u_metrology::{random::create_rng, CoverageSpec, Uncertainty};
//!
//! let cov = CoverageSpec::from_factor(2.0).unwrap();
//! let r21 = Uncertainty::rectangular(100.0, 0.005, cov).unwrap();
//! let r23 = Uncertainty::normal(100.0, 0.01, cov).unwrap();
//!
//! let mut rng = create_rng(42);
//! let ratio = r21
//!     .sample_with(Some(50_000), &mut rng)
//!     .unwrap()
//!     .try_div(r23.sample_with(Some(50_000), &mut rng).unwrap())
//!     .unwrap();
//! assert!((ratio.mean() - 1.0).abs() < 1e-3);
//! ```

pub mod config;
pub mod coverage;
pub mod distributions;
pub mod error;
pub mod observations;
pub mod random;
pub mod record;
pub mod samples;
pub mod special;
pub mod stats;
pub mod uncertainty;

pub use config::MonteCarloConfig;
pub use coverage::CoverageSpec;
pub use error::{Result, UncertaintyError};
pub use observations::DirectObservations;
pub use record::{FieldValue, Record};
pub use samples::{MonteCarloSampleSet, Operand};
pub use uncertainty::{Classification, Distribution, DistributionKind, Uncertainty};
