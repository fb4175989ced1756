//! Probability distributions a factor can follow.
//!
//! Every family is described by one `Distribution` variant carrying exactly the
//! fields that family needs. The factor bounds are not part of the variant; they
//! live on the `ParameterDescriptor` and are passed in explicitly, so
//! the functions here stay pure.

use rand::Rng;
use rand_distr::Distribution as RandDistribution;
use serde::{Deserialize, Serialize};
use statrs::function::erf::erfc;

use crate::error::{Result, SensitivityError};

/// Distribution family of a single factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type")]
pub enum Distribution {
    /// Flat density over [lower, upper]
    #[default]
    Uniform,
    /// Triangle with its peak at `mode`, supported on [lower, upper]
    Triangular { mode: f64 },
    /// Flat top between `mode_low` and `mode_high`, linear flanks down to the bounds
    Trapezoidal { mode_low: f64, mode_high: f64 },
    /// Gaussian truncated to the bounds; `mean ± 2·std_dev` must stay within them
    Normal { mean: f64, std_dev: f64 },
    /// Log-normal truncated to the bounds; `mu` and `sigma` describe the
    /// underlying normal
    LogNormal { mu: f64, sigma: f64 },
}

impl Distribution {
    /// Short family name used in messages
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Distribution::Uniform => "uniform",
            Distribution::Triangular { .. } => "triangular",
            Distribution::Trapezoidal { .. } => "trapezoidal",
            Distribution::Normal { .. } => "normal",
            Distribution::LogNormal { .. } => "log-normal",
        }
    }

    #[must_use]
    pub fn is_uniform(&self) -> bool {
        matches!(self, Distribution::Uniform)
    }

    /// Check the family arguments against the factor bounds.
    pub fn validate(&self, lower: f64, upper: f64) -> Result<()> {
        let fail = |reason: String| Err(SensitivityError::Configuration(reason));
        match *self {
            Distribution::Uniform => Ok(()),
            Distribution::Triangular { mode } => {
                if !mode.is_finite() || mode < lower || mode > upper {
                    return fail(format!(
                        "triangular mode {mode} must lie within [{lower}, {upper}]"
                    ));
                }
                Ok(())
            }
            Distribution::Trapezoidal {
                mode_low,
                mode_high,
            } => {
                if !mode_low.is_finite()
                    || !mode_high.is_finite()
                    || lower > mode_low
                    || mode_low > mode_high
                    || mode_high > upper
                {
                    return fail(format!(
                        "trapezoidal modes must satisfy {lower} <= {mode_low} <= {mode_high} <= {upper}"
                    ));
                }
                Ok(())
            }
            Distribution::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
                    return fail(format!(
                        "normal needs a finite mean and a positive std_dev (mean={mean}, std_dev={std_dev})"
                    ));
                }
                if mean - 2.0 * std_dev < lower || mean + 2.0 * std_dev > upper {
                    return fail(format!(
                        "normal mean ± 2·std_dev ({}, {}) leaves [{lower}, {upper}]",
                        mean - 2.0 * std_dev,
                        mean + 2.0 * std_dev
                    ));
                }
                Ok(())
            }
            Distribution::LogNormal { mu, sigma } => {
                if !mu.is_finite() || !sigma.is_finite() || sigma <= 0.0 {
                    return fail(format!(
                        "log-normal needs a finite mu and a positive sigma (mu={mu}, sigma={sigma})"
                    ));
                }
                if lower < 0.0 {
                    return fail(format!("log-normal lower bound {lower} is negative"));
                }
                let lo = (mu - 2.0 * sigma).exp();
                let hi = (mu + 2.0 * sigma).exp();
                if lo < lower || hi > upper {
                    return fail(format!(
                        "log-normal exp(mu ± 2·sigma) ({lo}, {hi}) leaves [{lower}, {upper}]"
                    ));
                }
                Ok(())
            }
        }
    }

    /// Probability density at `x`.
    #[must_use]
    pub fn density(&self, x: f64, lower: f64, upper: f64) -> f64 {
        match *self {
            Distribution::Uniform => {
                if (lower..=upper).contains(&x) {
                    1.0 / (upper - lower)
                } else {
                    0.0
                }
            }
            Distribution::Triangular { mode } => {
                let width = upper - lower;
                if x < lower || x > upper {
                    0.0
                } else if x < mode {
                    2.0 * (x - lower) / (width * (mode - lower))
                } else if x > mode {
                    2.0 * (upper - x) / (width * (upper - mode))
                } else {
                    2.0 / width
                }
            }
            Distribution::Trapezoidal {
                mode_low,
                mode_high,
            } => {
                let height = trapezoid_height(lower, mode_low, mode_high, upper);
                if x < lower || x > upper {
                    0.0
                } else if x < mode_low {
                    height * (x - lower) / (mode_low - lower)
                } else if x > mode_high {
                    height * (upper - x) / (upper - mode_high)
                } else {
                    height
                }
            }
            Distribution::Normal { mean, std_dev } => {
                if x < lower || x > upper {
                    return 0.0;
                }
                let mass = TruncatedNormal::of_normal(mean, std_dev, lower, upper).mass();
                standard_normal_density((x - mean) / std_dev) / (std_dev * mass)
            }
            Distribution::LogNormal { mu, sigma } => {
                if x <= 0.0 || x < lower || x > upper {
                    return 0.0;
                }
                let mass = TruncatedNormal::of_log_normal(mu, sigma, lower, upper).mass();
                standard_normal_density((x.ln() - mu) / sigma) / (x * sigma * mass)
            }
        }
    }

    /// Map a unit-interval coordinate onto the factor range.
    ///
    /// Uniform factors map linearly (`lower + u·(upper − lower)`); the other
    /// families go through their inverse CDF. Normal and log-normal factors use
    /// the CDF truncated to the bounds, so no mass piles up on either bound.
    #[must_use]
    pub fn rescale(&self, unit: f64, lower: f64, upper: f64) -> f64 {
        let u = unit.clamp(0.0, 1.0);
        let value = match *self {
            Distribution::Uniform => lower + u * (upper - lower),
            Distribution::Triangular { mode } => {
                let width = upper - lower;
                let split = (mode - lower) / width;
                if u < split {
                    lower + (u * width * (mode - lower)).sqrt()
                } else {
                    upper - ((1.0 - u) * width * (upper - mode)).sqrt()
                }
            }
            Distribution::Trapezoidal {
                mode_low,
                mode_high,
            } => trapezoid_quantile(u, lower, mode_low, mode_high, upper),
            Distribution::Normal { mean, std_dev } => {
                let window = TruncatedNormal::of_normal(mean, std_dev, lower, upper);
                mean + std_dev * window.quantile(u)
            }
            Distribution::LogNormal { mu, sigma } => {
                let window = TruncatedNormal::of_log_normal(mu, sigma, lower, upper);
                (mu + sigma * window.quantile(u)).exp()
            }
        };
        // Only absorbs the approximation error of the quantile at the edges.
        value.clamp(lower, upper)
    }

    /// Draw `count` values.
    ///
    /// Every family is confined to the bounds by construction; normal and
    /// log-normal draws come from their truncated inverse CDF.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        lower: f64,
        upper: f64,
        count: usize,
    ) -> Result<Vec<f64>> {
        let invalid = |reason: &str| {
            SensitivityError::Configuration(format!("invalid {} parameters: {reason}", self.name()))
        };
        let values = match *self {
            Distribution::Uniform => (0..count)
                .map(|_| rng.random_range(lower..=upper))
                .collect(),
            Distribution::Triangular { mode } => {
                let dist = rand_distr::Triangular::new(lower, upper, mode)
                    .map_err(|_| invalid("mode must lie within the bounds"))?;
                (0..count).map(|_| dist.sample(rng)).collect()
            }
            Distribution::Trapezoidal {
                mode_low,
                mode_high,
            } => (0..count)
                .map(|_| trapezoid_quantile(rng.random(), lower, mode_low, mode_high, upper))
                .collect(),
            Distribution::Normal { std_dev: scale, .. }
            | Distribution::LogNormal { sigma: scale, .. } => {
                if !(scale.is_finite() && scale > 0.0) {
                    return Err(invalid("scale must be positive and finite"));
                }
                (0..count)
                    .map(|_| self.rescale(rng.random(), lower, upper))
                    .collect()
            }
        };
        Ok(values)
    }
}

fn trapezoid_height(lower: f64, mode_low: f64, mode_high: f64, upper: f64) -> f64 {
    2.0 / ((upper - lower) + (mode_high - mode_low))
}

fn trapezoid_quantile(u: f64, lower: f64, mode_low: f64, mode_high: f64, upper: f64) -> f64 {
    let height = trapezoid_height(lower, mode_low, mode_high, upper);
    let rising = height * (mode_low - lower) / 2.0;
    let plateau = rising + height * (mode_high - mode_low);
    if u <= rising {
        lower + (2.0 * u * (mode_low - lower) / height).sqrt()
    } else if u <= plateau {
        mode_low + (u - rising) / height
    } else {
        upper - (2.0 * (1.0 - u) * (upper - mode_high) / height).sqrt()
    }
}

/// Standard normal probability density
#[must_use]
pub fn standard_normal_density(z: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * z * z).exp()
}

// Acklam's rational approximation; relative error below 1.15e-9.
const CENTRAL_NUM: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_690e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const CENTRAL_DEN: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];
const TAIL_NUM: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const TAIL_DEN: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];
const TAIL_SPLIT: f64 = 0.02425;

fn horner(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, c| acc * x + c)
}

fn tail(q: f64) -> f64 {
    horner(&TAIL_NUM, q) / (horner(&TAIL_DEN, q) * q + 1.0)
}

fn probit(p: f64) -> f64 {
    if p < TAIL_SPLIT {
        tail((-2.0 * p.ln()).sqrt())
    } else if p > 1.0 - TAIL_SPLIT {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    } else {
        let q = p - 0.5;
        let r = q * q;
        horner(&CENTRAL_NUM, r) * q / (horner(&CENTRAL_DEN, r) * r + 1.0)
    }
}

/// Standard normal CDF
#[must_use]
pub fn standard_normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

/// Probability window `[Φ(a), Φ(b)]` of a standard normal cut at `a` and `b`.
struct TruncatedNormal {
    low: f64,
    high: f64,
}

impl TruncatedNormal {
    fn of_normal(mean: f64, std_dev: f64, lower: f64, upper: f64) -> Self {
        Self {
            low: standard_normal_cdf((lower - mean) / std_dev),
            high: standard_normal_cdf((upper - mean) / std_dev),
        }
    }

    /// Bounds are taken in log space; a zero lower bound gives `Φ(−∞) = 0`.
    fn of_log_normal(mu: f64, sigma: f64, lower: f64, upper: f64) -> Self {
        Self {
            low: standard_normal_cdf((lower.ln() - mu) / sigma),
            high: standard_normal_cdf((upper.ln() - mu) / sigma),
        }
    }

    fn mass(&self) -> f64 {
        self.high - self.low
    }

    /// Standard normal quantile of `u` spread over the window
    fn quantile(&self, u: f64) -> f64 {
        clamped_probit(self.low + u * self.mass())
    }
}

fn clamped_probit(u: f64) -> f64 {
    const EDGE: f64 = 1e-12;
    probit(u.clamp(EDGE, 1.0 - EDGE))
}

/// Quantile of the standard normal distribution.
///
/// Fails with `Domain` unless `0 < p < 1`.
pub fn inverse_standard_normal(p: f64) -> Result<f64> {
    if p.is_nan() || p <= 0.0 || p >= 1.0 {
        return Err(SensitivityError::Domain {
            value: p,
            reason: "probability must lie in the open interval (0, 1)",
        });
    }
    Ok(probit(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn integrate(dist: &Distribution, lower: f64, upper: f64) -> f64 {
        let steps = 20_000;
        let h = (upper - lower) / steps as f64;
        (0..=steps)
            .map(|i| {
                let x = lower + h * i as f64;
                let w = if i == 0 || i == steps { 0.5 } else { 1.0 };
                w * dist.density(x, lower, upper)
            })
            .sum::<f64>()
            * h
    }

    #[test]
    fn test_inverse_standard_normal_known_values() {
        let cases = [
            (0.5, 0.0),
            (0.975, 1.959_963_984_540_054),
            (0.01, -2.326_347_874_040_841),
            (0.001, -3.090_232_306_167_813),
            (0.8413447460685429, 1.0),
        ];
        for (p, expected) in cases {
            let z = inverse_standard_normal(p).unwrap();
            assert!(
                (z - expected).abs() < 1e-8,
                "probit({p}) = {z}, expected {expected}"
            );
        }
    }

    #[test]
    fn test_inverse_standard_normal_symmetry() {
        for p in [0.001, 0.02, 0.1, 0.3, 0.45] {
            let lo = inverse_standard_normal(p).unwrap();
            let hi = inverse_standard_normal(1.0 - p).unwrap();
            assert!((lo + hi).abs() < 1e-8);
        }
    }

    #[test]
    fn test_inverse_standard_normal_domain() {
        for p in [0.0, 1.0, -0.2, 1.5, f64::NAN] {
            assert!(matches!(
                inverse_standard_normal(p),
                Err(SensitivityError::Domain { .. })
            ));
        }
    }

    #[test]
    fn test_triangular_validation() {
        let ok = Distribution::Triangular { mode: 5.0 };
        assert!(ok.validate(0.0, 10.0).is_ok());

        let bad = Distribution::Triangular { mode: 12.0 };
        assert!(matches!(
            bad.validate(0.0, 10.0),
            Err(SensitivityError::Configuration(_))
        ));
    }

    #[test]
    fn test_trapezoidal_validation() {
        let ok = Distribution::Trapezoidal {
            mode_low: 2.0,
            mode_high: 6.0,
        };
        assert!(ok.validate(0.0, 10.0).is_ok());

        let swapped = Distribution::Trapezoidal {
            mode_low: 6.0,
            mode_high: 2.0,
        };
        assert!(swapped.validate(0.0, 10.0).is_err());
    }

    #[test]
    fn test_normal_validation_two_sigma_rule() {
        let ok = Distribution::Normal {
            mean: 5.0,
            std_dev: 2.0,
        };
        assert!(ok.validate(0.0, 10.0).is_ok());

        let too_wide = Distribution::Normal {
            mean: 5.0,
            std_dev: 3.0,
        };
        assert!(too_wide.validate(0.0, 10.0).is_err());
    }

    #[test]
    fn test_log_normal_validation() {
        let dist = Distribution::LogNormal {
            mu: 1.0,
            sigma: 0.4,
        };
        // exp(1 ± 0.8) spans roughly [1.22, 6.05]
        assert!(dist.validate(0.0, 10.0).is_ok());
        assert!(dist.validate(1.0, 7.0).is_ok());

        assert!(matches!(
            dist.validate(-1.0, 10.0),
            Err(SensitivityError::Configuration(msg)) if msg.contains("negative")
        ));
        assert!(dist.validate(0.0, 5.0).is_err());
        assert!(dist.validate(1.5, 10.0).is_err());

        for sigma in [0.0, -0.1, f64::NAN] {
            let flat = Distribution::LogNormal { mu: 1.0, sigma };
            assert!(flat.validate(0.0, 10.0).is_err(), "sigma = {sigma}");
        }
    }

    #[test]
    fn test_truncated_density_vanishes_outside_bounds() {
        let dist = Distribution::Normal {
            mean: 5.0,
            std_dev: 2.0,
        };
        assert_eq!(dist.density(-0.1, 0.0, 10.0), 0.0);
        assert_eq!(dist.density(10.1, 0.0, 10.0), 0.0);
        // Truncation scales the peak up by 1 / P(|z| < 2.5)
        let peak = standard_normal_density(0.0) / 2.0;
        let mass = standard_normal_cdf(2.5) - standard_normal_cdf(-2.5);
        assert!((dist.density(5.0, 0.0, 10.0) - peak / mass).abs() < 1e-12);
    }

    #[test]
    fn test_densities_integrate_to_one() {
        let families = [
            Distribution::Uniform,
            Distribution::Triangular { mode: 3.0 },
            Distribution::Trapezoidal {
                mode_low: 2.0,
                mode_high: 7.0,
            },
            Distribution::Normal {
                mean: 5.0,
                std_dev: 2.0,
            },
            Distribution::LogNormal {
                mu: 1.0,
                sigma: 0.4,
            },
        ];
        for dist in families {
            let area = integrate(&dist, 0.0, 10.0);
            assert!((area - 1.0).abs() < 1e-3, "{} area = {area}", dist.name());
        }
    }

    #[test]
    fn test_rescale_uniform_is_linear() {
        let dist = Distribution::Uniform;
        assert_eq!(dist.rescale(0.0, 2.0, 4.0), 2.0);
        assert_eq!(dist.rescale(0.25, 2.0, 4.0), 2.5);
        assert_eq!(dist.rescale(1.0, 2.0, 4.0), 4.0);
    }

    #[test]
    fn test_rescale_triangular_and_trapezoidal_quantiles() {
        let tri = Distribution::Triangular { mode: 5.0 };
        assert!((tri.rescale(0.5, 0.0, 10.0) - 5.0).abs() < 1e-12);
        assert!(tri.rescale(0.1, 0.0, 10.0) < 5.0);

        let trap = Distribution::Trapezoidal {
            mode_low: 2.0,
            mode_high: 8.0,
        };
        // Symmetric trapezoid: median at the centre
        assert!((trap.rescale(0.5, 0.0, 10.0) - 5.0).abs() < 1e-12);
        assert_eq!(trap.rescale(0.0, 0.0, 10.0), 0.0);
        assert!((trap.rescale(1.0, 0.0, 10.0) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_rescale_normal_stays_in_bounds() {
        let dist = Distribution::Normal {
            mean: 5.0,
            std_dev: 2.0,
        };
        for u in [0.0, 1e-9, 0.3, 0.5, 0.99, 1.0] {
            let x = dist.rescale(u, 0.0, 10.0);
            assert!((0.0..=10.0).contains(&x));
        }
        assert!((dist.rescale(0.5, 0.0, 10.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_rescale_log_normal_median() {
        let (mu, sigma) = (1.0, 0.4);
        let dist = Distribution::LogNormal { mu, sigma };
        // Bounds symmetric in log space keep the median at exp(mu)
        let lower = (mu - 3.0 * sigma).exp();
        let upper = (mu + 3.0 * sigma).exp();
        let median = dist.rescale(0.5, lower, upper);
        assert!((median - mu.exp()).abs() < 1e-9, "median = {median}");
        assert!(dist.rescale(0.1, lower, upper) < median);
        assert!(dist.rescale(0.9, lower, upper) > median);
    }

    #[test]
    fn test_sample_log_normal_is_truncated() {
        let mut rng = StdRng::seed_from_u64(23);
        let dist = Distribution::LogNormal {
            mu: 1.0,
            sigma: 0.4,
        };
        let values = dist.sample(&mut rng, 1.0, 7.0, 20_000).unwrap();
        assert!(values.iter().all(|&v| v > 1.0 && v < 7.0));

        let bad = Distribution::LogNormal {
            mu: 1.0,
            sigma: 0.0,
        };
        assert!(bad.sample(&mut rng, 1.0, 7.0, 10).is_err());
    }

    #[test]
    fn test_standard_normal_cdf() {
        assert!((standard_normal_cdf(0.0) - 0.5).abs() < 1e-15);
        assert!((standard_normal_cdf(1.959_963_985) - 0.975).abs() < 1e-9);
        assert!((standard_normal_cdf(-1.0) + standard_normal_cdf(1.0) - 1.0).abs() < 1e-15);
        let p = 0.3;
        assert!((standard_normal_cdf(inverse_standard_normal(p).unwrap()) - p).abs() < 1e-8);
    }

    #[test]
    fn test_sample_uniform_mean() {
        let mut rng = StdRng::seed_from_u64(7);
        let values = Distribution::Uniform
            .sample(&mut rng, -1.0, 3.0, 20_000)
            .unwrap();
        assert!(values.iter().all(|v| (-1.0..=3.0).contains(v)));
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert!((mean - 1.0).abs() < 0.05, "mean = {mean}");
    }

    #[test]
    fn test_sample_triangular_and_trapezoidal_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let tri = Distribution::Triangular { mode: 1.0 };
        let trap = Distribution::Trapezoidal {
            mode_low: 1.0,
            mode_high: 2.0,
        };
        for dist in [tri, trap] {
            let values = dist.sample(&mut rng, 0.0, 4.0, 2_000).unwrap();
            assert!(values.iter().all(|v| (0.0..=4.0).contains(v)));
        }
    }
}
