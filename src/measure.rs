use std::fmt;

use thiserror::Error;

use crate::likelihood::LogLikelihood;
use crate::posterior::Posterior;

#[derive(Error, Debug)]
pub enum MeasureError {
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("expected {expected} free parameters, got {found}")]
    ArityMismatch { expected: usize, found: usize },
    #[error("{family} has no parameter named `{name}`")]
    UnknownParameter { family: &'static str, name: String },
    #[error("{family} requires a value for `{name}`")]
    MissingParameter {
        family: &'static str,
        name: &'static str,
    },
    #[error("element at position {position} has a different base measure than the first element")]
    HeterogeneousBaseMeasure { position: usize },
    #[error("invalid value {value} for parameter `{name}`")]
    InvalidParameter { name: &'static str, value: f64 },
    #[error("grid dimensions must be positive with a size that fits in usize, got {0:?}")]
    InvalidDimension(Vec<usize>),
    #[error("index source has no elements")]
    EmptyIndex,
    #[error("lazy source cannot be iterated a second time")]
    NotRestartable,
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, MeasureError>;

/// The reference measure a density is expressed against.
///
/// `Weighted` scales a measure by `exp(log_weight)`, `Power` repeats one
/// base measure over every position of an index shape.
#[derive(Debug, Clone, PartialEq)]
pub enum BaseMeasure {
    Lebesgue,
    Counting,
    Weighted {
        log_weight: f64,
        base: Box<BaseMeasure>,
    },
    Power {
        base: Box<BaseMeasure>,
        shape: Vec<usize>,
    },
}

impl BaseMeasure {
    pub fn weighted(log_weight: f64, base: BaseMeasure) -> BaseMeasure {
        BaseMeasure::Weighted {
            log_weight,
            base: Box::new(base),
        }
    }

    pub fn power(base: BaseMeasure, shape: &[usize]) -> BaseMeasure {
        BaseMeasure::Power {
            base: Box::new(base),
            shape: shape.to_vec(),
        }
    }

    /// Total log normalizing constant carried by this base measure.
    pub fn log_weight(&self) -> f64 {
        match self {
            BaseMeasure::Lebesgue | BaseMeasure::Counting => 0.,
            BaseMeasure::Weighted { log_weight, base } => log_weight + base.log_weight(),
            BaseMeasure::Power { base, shape } => {
                base.log_weight() * shape.iter().map(|&d| d as f64).product::<f64>()
            }
        }
    }
}

impl fmt::Display for BaseMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseMeasure::Lebesgue => write!(f, "Lebesgue"),
            BaseMeasure::Counting => write!(f, "Counting"),
            BaseMeasure::Weighted { log_weight, base } => {
                write!(f, "({} * {:.4})", base, log_weight.exp())
            }
            BaseMeasure::Power { base, shape } => {
                let dims = shape.iter().map(|d| d.to_string()).collect::<Vec<_>>();
                write!(f, "{}^({})", base, dims.join(", "))
            }
        }
    }
}

/// Shape and support of a measure's sample space, for downstream inference code.
#[derive(Debug, Clone, PartialEq)]
pub enum VarTransform {
    Real,
    Positive,
    NonNegativeInteger,
    Array {
        element: Box<VarTransform>,
        shape: Vec<usize>,
    },
}

impl VarTransform {
    /// Number of scalar coordinates in one point.
    pub fn dim(&self) -> usize {
        match self {
            VarTransform::Real | VarTransform::Positive | VarTransform::NonNegativeInteger => 1,
            VarTransform::Array { element, shape } => {
                element.dim() * shape.iter().product::<usize>()
            }
        }
    }
}

/// Anything with a log-density against a base measure.
pub trait Density {
    type Point;

    /// Log-density relative to `self.basemeasure()`.
    ///
    /// This leaves out the normalizing constants that the base measure
    /// carries, so it is the cheaper quantity to accumulate.
    fn logdensity_rel(&self, x: &Self::Point) -> Result<f64>;

    fn basemeasure(&self) -> Result<BaseMeasure>;

    /// Log-density including the constants of the base measure.
    fn logdensity(&self, x: &Self::Point) -> Result<f64> {
        Ok(self.logdensity_rel(x)? + self.basemeasure()?.log_weight())
    }

    fn density(&self, x: &Self::Point) -> Result<f64> {
        Ok(self.logdensity(x)?.exp())
    }

    /// Combine with a likelihood into an unnormalized posterior.
    fn pointwise<L>(self, likelihood: L) -> Posterior<Self, L>
    where
        Self: Sized,
        L: LogLikelihood<Self::Point>,
    {
        Posterior::new(self, likelihood)
    }
}

/// A density that can also be sampled.
pub trait Measure: Density {
    /// Draw one point. The generator is always passed in explicitly.
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Result<Self::Point>;

    fn transform(&self) -> Result<VarTransform>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn power_weight_scales_with_shape() {
        let base = BaseMeasure::power(BaseMeasure::weighted(-0.5, BaseMeasure::Lebesgue), &[2, 3]);
        assert_eq!(base.log_weight(), -3.);
        assert_eq!(BaseMeasure::Counting.log_weight(), 0.);
    }

    #[test]
    fn display_base() {
        let base = BaseMeasure::power(BaseMeasure::Lebesgue, &[3, 2]);
        assert_eq!(base.to_string(), "Lebesgue^(3, 2)");
    }

    #[test]
    fn transform_dim() {
        let t = VarTransform::Array {
            element: Box::new(VarTransform::Array {
                element: Box::new(VarTransform::Real),
                shape: vec![2],
            }),
            shape: vec![3, 4],
        };
        assert_eq!(t.dim(), 24);
    }
}
