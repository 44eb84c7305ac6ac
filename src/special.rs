//! Standard normal density and quantile.
//!
//! These two functions define the coverage pair: `k = Φ⁻¹(p)` uses
//! [`normal_quantile`], the reverse mapping `p = 1 − φ(k)` uses
//! [`normal_density`].

/// 1/√(2π).
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Standard normal density `φ(x) = exp(−x²/2)/√(2π)`.
///
/// NaN propagates.
///
/// ```
/// use u_metrology::special::normal_density;
/// assert!((normal_density(2.0) - 0.05399096651318806).abs() < 1e-16);
/// ```
pub fn normal_density(x: f64) -> f64 {
    FRAC_1_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal quantile `z = Φ⁻¹(p)`.
///
/// Rational approximation by P. J. Acklam (2003): one central region for
/// `0.02425 ≤ p ≤ 0.97575` in `(p − ½)²`, and a tail form in `√(−2 ln q)`
/// mirrored for the upper tail. Relative error is below 1.15 × 10⁻⁹.
///
/// Returns NaN outside `[0, 1]` and `∓∞` at the endpoints.
///
/// ```
/// use u_metrology::special::normal_quantile;
/// assert!((normal_quantile(0.975) - 1.959963984540054).abs() < 1e-8);
/// assert_eq!(normal_quantile(1.0), f64::INFINITY);
/// ```
pub fn normal_quantile(p: f64) -> f64 {
    const CENTRAL_NUM: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const CENTRAL_DEN: [f64; 6] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
        1.0,
    ];
    const TAIL_NUM: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const TAIL_DEN: [f64; 5] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
        1.0,
    ];
    const BREAK: f64 = 0.02425;

    match p {
        p if p.is_nan() || !(0.0..=1.0).contains(&p) => f64::NAN,
        p if p == 0.0 => f64::NEG_INFINITY,
        p if p == 1.0 => f64::INFINITY,
        p if p < BREAK => lower_tail(p, &TAIL_NUM, &TAIL_DEN),
        p if p > 1.0 - BREAK => -lower_tail(1.0 - p, &TAIL_NUM, &TAIL_DEN),
        p => {
            let q = p - 0.5;
            let r = q * q;
            q * horner(&CENTRAL_NUM, r) / horner(&CENTRAL_DEN, r)
        }
    }
}

fn lower_tail(p: f64, num: &[f64], den: &[f64]) -> f64 {
    let t = (-2.0 * p.ln()).sqrt();
    horner(num, t) / horner(den, t)
}

/// Evaluates a polynomial with coefficients from the highest degree down.
fn horner(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}
