use std::fmt;

use crate::likelihood::LogLikelihood;
use crate::measure::{BaseMeasure, Density, Result};

/// Pointwise product of a prior and a likelihood: an unnormalized posterior.
///
/// Its log-density at `θ` is the prior's plus the likelihood's, and it lives
/// on the prior's base measure. A posterior is itself a `Density`, so more
/// likelihoods can be multiplied in with `pointwise`.
#[derive(Debug, Clone)]
pub struct Posterior<P, L> {
    prior: P,
    likelihood: L,
}

impl<P, L> Posterior<P, L>
where
    P: Density,
    L: LogLikelihood<P::Point>,
{
    pub fn new(prior: P, likelihood: L) -> Self {
        Posterior { prior, likelihood }
    }

    pub fn prior(&self) -> &P {
        &self.prior
    }

    pub fn likelihood(&self) -> &L {
        &self.likelihood
    }

    pub fn into_parts(self) -> (P, L) {
        (self.prior, self.likelihood)
    }
}

impl<P, L> Density for Posterior<P, L>
where
    P: Density,
    L: LogLikelihood<P::Point>,
{
    type Point = P::Point;

    fn logdensity_rel(&self, theta: &P::Point) -> Result<f64> {
        Ok(self.prior.logdensity_rel(theta)? + self.likelihood.unnormalized_loglikelihood(theta)?)
    }

    /// Prior log-density plus the full log-likelihood.
    ///
    /// The likelihood's normalizing constants are not part of the prior's
    /// base measure, so unlike the default this is not
    /// `logdensity_rel + basemeasure().log_weight()`; the two differ by the
    /// likelihood's constants.
    fn logdensity(&self, theta: &P::Point) -> Result<f64> {
        Ok(self.prior.logdensity(theta)? + self.likelihood.loglikelihood(theta)?)
    }

    fn basemeasure(&self) -> Result<BaseMeasure> {
        self.prior.basemeasure()
    }
}

impl<P: fmt::Display, L: fmt::Display> fmt::Display for Posterior<P, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ⊙ {}", self.prior, self.likelihood)
    }
}
