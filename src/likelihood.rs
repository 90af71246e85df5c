//! Likelihoods: a measure family with a fixed observation, seen as a
//! function of the family's parameters.

use std::fmt;
use std::marker::PhantomData;

use log::warn;

use crate::measure::{MeasureError, Result};
use crate::params::{AsParams, NamedParams, ParamValues, ParameterizedMeasure};

/// Something that scores parameter values `Theta` against fixed data.
pub trait LogLikelihood<Theta: ?Sized> {
    /// Log-likelihood including the family's normalizing constants.
    fn loglikelihood(&self, theta: &Theta) -> Result<f64>;

    /// Log-likelihood relative to the family's base measure.
    fn unnormalized_loglikelihood(&self, theta: &Theta) -> Result<f64>;
}

impl<T, Theta> LogLikelihood<Theta> for &T
where
    T: LogLikelihood<Theta> + ?Sized,
    Theta: ?Sized,
{
    fn loglikelihood(&self, theta: &Theta) -> Result<f64> {
        (**self).loglikelihood(theta)
    }

    fn unnormalized_loglikelihood(&self, theta: &Theta) -> Result<f64> {
        (**self).unnormalized_loglikelihood(theta)
    }
}

/// The family `M` observed at `x`, with some parameters optionally fixed.
///
/// Parameters not in the constraint are free. Positional parameter values
/// are matched to the free parameters in the family's declaration order.
pub struct Likelihood<M: ParameterizedMeasure> {
    constraint: NamedParams,
    x: M::Point,
    _family: PhantomData<fn() -> M>,
}

impl<M: ParameterizedMeasure> Likelihood<M> {
    /// All parameters of `M` are free.
    pub fn new(x: M::Point) -> Self {
        Likelihood {
            constraint: NamedParams::new(),
            x,
            _family: PhantomData,
        }
    }

    /// Likelihood for the family of `measure`. Its parameter values are not
    /// used; all parameters are free.
    pub fn of(_measure: &M, x: M::Point) -> Self {
        Self::new(x)
    }

    /// Fix the parameters named in `constraint`; the rest stay free.
    pub fn constrained(constraint: impl Into<NamedParams>, x: M::Point) -> Result<Self> {
        let constraint = constraint.into();
        if let Some(name) = constraint
            .names()
            .find(|n| !M::PARAM_NAMES.iter().any(|p| p == n))
        {
            return Err(MeasureError::UnknownParameter {
                family: M::NAME,
                name: name.to_string(),
            });
        }
        Ok(Likelihood {
            constraint,
            x,
            _family: PhantomData,
        })
    }

    pub fn constraint(&self) -> &NamedParams {
        &self.constraint
    }

    pub fn observation(&self) -> &M::Point {
        &self.x
    }

    /// Free parameter names in declaration order.
    pub fn free_params(&self) -> Vec<&'static str> {
        M::PARAM_NAMES
            .iter()
            .copied()
            .filter(|name| !self.constraint.contains(name))
            .collect()
    }

    /// The measure these parameter values select, constraint applied.
    ///
    /// Fixed parameters always take their constrained value, even if `p`
    /// names them.
    pub fn resolve<P: AsParams + ?Sized>(&self, p: &P) -> Result<M> {
        let mut named = match p.as_params() {
            ParamValues::Named(named) => named,
            ParamValues::Positional(values) => {
                let free = self.free_params();
                if values.len() != free.len() {
                    return Err(MeasureError::ArityMismatch {
                        expected: free.len(),
                        found: values.len(),
                    });
                }
                free.into_iter().zip(values).collect()
            }
        };
        for (name, value) in self.constraint.iter() {
            if let Some(given) = named.insert(name, value) {
                if given != value {
                    warn!(
                        "{}: ignoring {} = {} for constrained parameter (fixed at {})",
                        M::NAME,
                        name,
                        given,
                        value
                    );
                }
            }
        }
        M::from_named(&named)
    }

    pub fn logdensity<P: AsParams + ?Sized>(&self, p: &P) -> Result<f64> {
        self.resolve(p)?.logdensity(&self.x)
    }

    pub fn unnormalized_logdensity<P: AsParams + ?Sized>(&self, p: &P) -> Result<f64> {
        self.resolve(p)?.logdensity_rel(&self.x)
    }

    pub fn density<P: AsParams + ?Sized>(&self, p: &P) -> Result<f64> {
        Ok(self.logdensity(p)?.exp())
    }
}

impl<M, Theta> LogLikelihood<Theta> for Likelihood<M>
where
    M: ParameterizedMeasure,
    Theta: AsParams + ?Sized,
{
    fn loglikelihood(&self, theta: &Theta) -> Result<f64> {
        self.logdensity(theta)
    }

    fn unnormalized_loglikelihood(&self, theta: &Theta) -> Result<f64> {
        self.unnormalized_logdensity(theta)
    }
}

impl<M> Clone for Likelihood<M>
where
    M: ParameterizedMeasure,
    M::Point: Clone,
{
    fn clone(&self) -> Self {
        Likelihood {
            constraint: self.constraint.clone(),
            x: self.x.clone(),
            _family: PhantomData,
        }
    }
}

impl<M> fmt::Display for Likelihood<M>
where
    M: ParameterizedMeasure,
    M::Point: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraint.is_empty() {
            write!(f, "Likelihood({}, {:?})", M::NAME, self.x)
        } else {
            write!(f, "Likelihood({}{}, {:?})", M::NAME, self.constraint, self.x)
        }
    }
}
