//! Scalar measure families usable as product-measure elements and likelihoods.

use std::fmt;

use rand_distr::Distribution;

use crate::math::{ln_factorial, LN_SQRT_2PI};
use crate::measure::{BaseMeasure, Density, Measure, MeasureError, Result, VarTransform};
use crate::params::{param_array, ParameterizedMeasure};

fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0. {
        return Err(MeasureError::InvalidParameter { name, value });
    }
    Ok(())
}

fn check_finite(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(MeasureError::InvalidParameter { name, value });
    }
    Ok(())
}

/// Normal distribution with mean `mu` and standard deviation `sigma`.
///
/// The `1/sqrt(2π)` factor lives in the base measure, so `logdensity_rel`
/// is just `-z²/2 - ln σ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normal {
    pub mu: f64,
    pub sigma: f64,
}

impl Normal {
    pub fn new(mu: f64, sigma: f64) -> Normal {
        Normal { mu, sigma }
    }

    pub fn standard() -> Normal {
        Normal::new(0., 1.)
    }

    fn validate(&self) -> Result<()> {
        check_finite("mu", self.mu)?;
        check_positive("sigma", self.sigma)
    }
}

impl Density for Normal {
    type Point = f64;

    fn logdensity_rel(&self, x: &f64) -> Result<f64> {
        self.validate()?;
        let z = (x - self.mu) / self.sigma;
        Ok(-0.5 * z * z - self.sigma.ln())
    }

    fn basemeasure(&self) -> Result<BaseMeasure> {
        Ok(BaseMeasure::weighted(-LN_SQRT_2PI, BaseMeasure::Lebesgue))
    }
}

impl Measure for Normal {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        self.validate()?;
        let dist = rand_distr::Normal::new(self.mu, self.sigma).map_err(|_| {
            MeasureError::InvalidParameter {
                name: "sigma",
                value: self.sigma,
            }
        })?;
        Ok(dist.sample(rng))
    }

    fn transform(&self) -> Result<VarTransform> {
        Ok(VarTransform::Real)
    }
}

impl ParameterizedMeasure for Normal {
    const NAME: &'static str = "Normal";
    const PARAM_NAMES: &'static [&'static str] = &["mu", "sigma"];

    fn from_param_slice(values: &[f64]) -> Result<Self> {
        let [mu, sigma] = param_array(values)?;
        Ok(Normal::new(mu, sigma))
    }

    fn param_values(&self) -> Vec<f64> {
        vec![self.mu, self.sigma]
    }
}

impl fmt::Display for Normal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Normal(mu = {}, sigma = {})", self.mu, self.sigma)
    }
}

/// Exponential distribution with the given rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exponential {
    pub rate: f64,
}

impl Exponential {
    pub fn new(rate: f64) -> Exponential {
        Exponential { rate }
    }
}

impl Density for Exponential {
    type Point = f64;

    fn logdensity_rel(&self, x: &f64) -> Result<f64> {
        check_positive("rate", self.rate)?;
        if *x < 0. {
            return Ok(f64::NEG_INFINITY);
        }
        Ok(self.rate.ln() - self.rate * x)
    }

    fn basemeasure(&self) -> Result<BaseMeasure> {
        Ok(BaseMeasure::Lebesgue)
    }
}

impl Measure for Exponential {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        check_positive("rate", self.rate)?;
        let dist = rand_distr::Exp::new(self.rate).map_err(|_| MeasureError::InvalidParameter {
            name: "rate",
            value: self.rate,
        })?;
        Ok(dist.sample(rng))
    }

    fn transform(&self) -> Result<VarTransform> {
        Ok(VarTransform::Positive)
    }
}

impl ParameterizedMeasure for Exponential {
    const NAME: &'static str = "Exponential";
    const PARAM_NAMES: &'static [&'static str] = &["rate"];

    fn from_param_slice(values: &[f64]) -> Result<Self> {
        let [rate] = param_array(values)?;
        Ok(Exponential::new(rate))
    }

    fn param_values(&self) -> Vec<f64> {
        vec![self.rate]
    }
}

impl fmt::Display for Exponential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exponential(rate = {})", self.rate)
    }
}

/// Poisson distribution over counts, relative to counting measure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Poisson {
    pub rate: f64,
}

impl Poisson {
    pub fn new(rate: f64) -> Poisson {
        Poisson { rate }
    }
}

impl Density for Poisson {
    type Point = u64;

    fn logdensity_rel(&self, k: &u64) -> Result<f64> {
        check_positive("rate", self.rate)?;
        Ok(*k as f64 * self.rate.ln() - self.rate - ln_factorial(*k))
    }

    fn basemeasure(&self) -> Result<BaseMeasure> {
        Ok(BaseMeasure::Counting)
    }
}

impl Measure for Poisson {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Result<u64> {
        check_positive("rate", self.rate)?;
        let dist =
            rand_distr::Poisson::new(self.rate).map_err(|_| MeasureError::InvalidParameter {
                name: "rate",
                value: self.rate,
            })?;
        let draw: f64 = dist.sample(rng);
        Ok(draw as u64)
    }

    fn transform(&self) -> Result<VarTransform> {
        Ok(VarTransform::NonNegativeInteger)
    }
}

impl ParameterizedMeasure for Poisson {
    const NAME: &'static str = "Poisson";
    const PARAM_NAMES: &'static [&'static str] = &["rate"];

    fn from_param_slice(values: &[f64]) -> Result<Self> {
        let [rate] = param_array(values)?;
        Ok(Poisson::new(rate))
    }

    fn param_values(&self) -> Vec<f64> {
        vec![self.rate]
    }
}

impl fmt::Display for Poisson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Poisson(rate = {})", self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    #[test]
    fn standard_normal_at_mean() {
        let lp = Normal::standard().logdensity(&0.).unwrap();
        assert_abs_diff_eq!(lp, -LN_SQRT_2PI, epsilon = 1e-12);
        let rel = Normal::standard().logdensity_rel(&0.).unwrap();
        assert_eq!(rel, 0.);
    }

    #[test]
    fn normal_symmetry_and_scale() {
        let n = Normal::new(1., 2.);
        let a = n.logdensity(&2.3).unwrap();
        let b = n.logdensity(&-0.3).unwrap();
        assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        let expected = -0.5 * (1.3f64 / 2.).powi(2) - 2f64.ln() - LN_SQRT_2PI;
        assert_abs_diff_eq!(a, expected, epsilon = 1e-12);
    }

    #[test]
    fn invalid_parameters() {
        assert!(matches!(
            Normal::new(0., 0.).logdensity(&0.),
            Err(MeasureError::InvalidParameter { name: "sigma", .. })
        ));
        assert!(Exponential::new(-1.).logdensity(&0.).is_err());
        assert!(Poisson::new(f64::NAN).logdensity(&0).is_err());
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        assert!(Exponential::new(0.).sample(&mut rng).is_err());
    }

    #[test]
    fn exponential_support() {
        let e = Exponential::new(2.);
        assert_abs_diff_eq!(e.logdensity(&0.5).unwrap(), 2f64.ln() - 1., epsilon = 1e-12);
        assert_eq!(e.logdensity(&-0.1).unwrap(), f64::NEG_INFINITY);
        assert_eq!(e.density(&-0.1).unwrap(), 0.);
    }

    #[test]
    fn poisson_pmf_sums_to_one() {
        let p = Poisson::new(3.5);
        let total: f64 = (0..100).map(|k| p.density(&k).unwrap()).sum();
        assert_abs_diff_eq!(total, 1., epsilon = 1e-10);
    }

    #[test]
    fn sampling_is_reproducible() {
        let n = Normal::new(3., 0.5);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let a: Vec<f64> = (0..5).map(|_| n.sample(&mut rng).unwrap()).collect();
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let b: Vec<f64> = (0..5).map(|_| n.sample(&mut rng).unwrap()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn params_in_declaration_order() {
        let n = Normal::from_positional(&[2., 3.]).unwrap();
        assert_eq!(n, Normal::new(2., 3.));
        assert_eq!(n.params().get("sigma"), Some(3.));
        assert!(matches!(
            Normal::from_positional(&[1.]),
            Err(MeasureError::ArityMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn param_slice_of_wrong_length() {
        assert!(matches!(
            Normal::from_param_slice(&[]),
            Err(MeasureError::ArityMismatch {
                expected: 2,
                found: 0
            })
        ));
        assert!(Exponential::from_param_slice(&[1., 2.]).is_err());
        assert_eq!(Poisson::from_param_slice(&[4.]).unwrap(), Poisson::new(4.));
    }
}
