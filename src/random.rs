//! Random sources and the Monte Carlo sampling primitives.
//!
//! Each primitive draws `count` independent values and returns them as an
//! owned `Vec<f64>`. Apart from consuming randomness from the supplied
//! generator they have no side effects.
//!
//! # Reproducibility
//!
//! Nothing in the crate seeds a generator on its own. For bit-exact
//! repeatability pass a generator from [`create_rng`] with a fixed seed.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal, StudentT};

use crate::error::{Result, UncertaintyError};

/// Creates a fast, seeded random number generator.
///
/// Uses `SmallRng` (Xoshiro256++). The sequence is deterministic for a
/// given seed on the same platform.
///
/// # Examples
/// ```
/// use u_metrology::random::create_rng;
/// use rand::Rng;
/// let mut rng = create_rng(42);
/// let x: f64 = rng.random();
/// assert!(x >= 0.0 && x < 1.0);
/// ```
pub fn create_rng(seed: u64) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::seed_from_u64(seed)
}

/// Creates a `SmallRng` seeded from operating-system entropy.
pub fn entropy_rng() -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    rand::rngs::SmallRng::from_os_rng()
}

/// Normally distributed draws `μ + Z·σ` with `Z ~ N(0, 1)`.
pub fn normal<R: Rng + ?Sized>(rng: &mut R, count: usize, mu: f64, sigma: f64) -> Vec<f64> {
    (0..count)
        .map(|_| {
            let z: f64 = StandardNormal.sample(rng);
            mu + z * sigma
        })
        .collect()
}

/// Rectangularly distributed draws on `[a, b]`: `a + U·(b − a)`.
pub fn rectangular<R: Rng + ?Sized>(rng: &mut R, count: usize, a: f64, b: f64) -> Vec<f64> {
    (0..count)
        .map(|_| a + rng.random::<f64>() * (b - a))
        .collect()
}

/// Trapezoidally distributed draws on `[a, b]` with shape factor `d`.
///
/// # Algorithm
/// Sum of two independent rectangular variables (JCGM 101:2008, §6.4.4):
///
/// ```text
/// X = a + ((b − a)/2) · ((1 + d)·U₁ + (1 − d)·U₂),   U₁, U₂ ~ U(0, 1)
/// ```
///
/// `d = 0` gives the symmetric triangular distribution, `d = 1` the
/// rectangular one. The caller validates `d`.
pub fn trapezoidal<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    a: f64,
    b: f64,
    d: f64,
) -> Vec<f64> {
    let half_span = (b - a) / 2.0;
    (0..count)
        .map(|_| {
            let u1: f64 = rng.random();
            let u2: f64 = rng.random();
            a + half_span * ((1.0 + d) * u1 + (1.0 - d) * u2)
        })
        .collect()
}

/// Scaled and shifted Student-t draws for the mean of `n` observations.
///
/// ```text
/// X = μ + T_{n−1} · σ/√n
/// ```
///
/// This is the reference distribution of the mean of `n` normally
/// distributed indications with sample mean `μ` and sample standard
/// deviation `σ` (JCGM 101:2008, §6.4.9).
///
/// # Errors
/// Returns `InvalidParameters` unless `n > 1`.
pub fn student_t<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    n: f64,
    mu: f64,
    sigma: f64,
) -> Result<Vec<f64>> {
    if !n.is_finite() || n <= 1.0 {
        return Err(UncertaintyError::InvalidParameters(format!(
            "Student-t sampling needs more than one observation, got n={n}"
        )));
    }
    let t = StudentT::new(n - 1.0)
        .map_err(|e| UncertaintyError::InvalidParameters(format!("Student-t: {e}")))?;
    let scale = sigma / n.sqrt();
    Ok((0..count)
        .map(|_| {
            let draw: f64 = t.sample(rng);
            mu + draw * scale
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats;

    const N: usize = 200_000;

    #[test]
    fn test_create_rng_deterministic() {
        let a = normal(&mut create_rng(42), 10, 0.0, 1.0);
        let b = normal(&mut create_rng(42), 10, 0.0, 1.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_entropy_rng_usable() {
        let draws = rectangular(&mut entropy_rng(), 16, -1.0, 1.0);
        assert_eq!(draws.len(), 16);
    }

    #[test]
    fn test_normal_moments() {
        let draws = normal(&mut create_rng(1), N, 10.0, 2.0);
        assert_eq!(draws.len(), N);
        assert!((stats::mean(&draws).unwrap() - 10.0).abs() < 0.03);
        assert!((stats::std_dev(&draws).unwrap() - 2.0).abs() < 0.03);
    }

    #[test]
    fn test_rectangular_bounds_and_spread() {
        let draws = rectangular(&mut create_rng(2), N, 99.995, 100.005);
        assert!(draws
            .iter()
            .all(|&x| (99.995 - 1e-12..=100.005 + 1e-12).contains(&x)));
        let expected = 0.005 / 3.0_f64.sqrt();
        let sd = stats::std_dev(&draws).unwrap();
        assert!((sd - expected).abs() / expected < 0.01, "sd {sd}");
    }

    #[test]
    fn test_trapezoidal_limits() {
        for d in [0.0, 0.5, 1.0] {
            let draws = trapezoidal(&mut create_rng(3), 10_000, -1.0, 1.0, d);
            assert!(draws.iter().all(|&x| (-1.0..=1.0).contains(&x)));
        }
    }

    #[test]
    fn test_trapezoidal_triangular_spread() {
        // d = 0: symmetric triangle on [−1, 1], σ = 2/√24
        let draws = trapezoidal(&mut create_rng(4), N, -1.0, 1.0, 0.0);
        let expected = 2.0 / 24.0_f64.sqrt();
        let sd = stats::std_dev(&draws).unwrap();
        assert!((sd - expected).abs() / expected < 0.01, "sd {sd}");
        assert!(stats::mean(&draws).unwrap().abs() < 0.01);
    }

    #[test]
    fn test_student_t_spread() {
        // n = 10 → ν = 9, σ(T) = √(9/7); scaled by σ/√n
        let draws = student_t(&mut create_rng(5), N, 10.0, 5.0, 1.0).unwrap();
        let expected = (9.0_f64 / 7.0).sqrt() / 10.0_f64.sqrt();
        let sd = stats::std_dev(&draws).unwrap();
        assert!((sd - expected).abs() / expected < 0.02, "sd {sd}, expected {expected}");
        assert!((stats::mean(&draws).unwrap() - 5.0).abs() < 0.01);
    }

    #[test]
    fn test_student_t_rejects_single_observation() {
        assert!(student_t(&mut create_rng(0), 10, 1.0, 0.0, 1.0).is_err());
        assert!(student_t(&mut create_rng(0), 10, f64::NAN, 0.0, 1.0).is_err());
    }
}
