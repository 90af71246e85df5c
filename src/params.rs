use std::collections::BTreeMap;
use std::fmt;

use ndarray::ArrayD;

use crate::measure::{Measure, MeasureError, Result};

/// Parameter values keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamedParams(BTreeMap<String, f64>);

impl NamedParams {
    pub fn new() -> NamedParams {
        NamedParams(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for NamedParams {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        NamedParams(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[(S, f64); N]> for NamedParams {
    fn from(pairs: [(S, f64); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl fmt::Display for NamedParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} = {}", name, value)?;
        }
        write!(f, ")")
    }
}

/// Parameters as handed to a likelihood: either by name or in the
/// declaration order of the free parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValues {
    Named(NamedParams),
    Positional(Vec<f64>),
}

/// Conversion of a point into likelihood parameters.
///
/// This is what lets a prior's sample space feed a likelihood.
pub trait AsParams {
    fn as_params(&self) -> ParamValues;
}

impl AsParams for ParamValues {
    fn as_params(&self) -> ParamValues {
        self.clone()
    }
}

impl AsParams for NamedParams {
    fn as_params(&self) -> ParamValues {
        ParamValues::Named(self.clone())
    }
}

impl AsParams for f64 {
    fn as_params(&self) -> ParamValues {
        ParamValues::Positional(vec![*self])
    }
}

impl AsParams for [f64] {
    fn as_params(&self) -> ParamValues {
        ParamValues::Positional(self.to_vec())
    }
}

impl<const N: usize> AsParams for [f64; N] {
    fn as_params(&self) -> ParamValues {
        ParamValues::Positional(self.to_vec())
    }
}

impl AsParams for Vec<f64> {
    fn as_params(&self) -> ParamValues {
        ParamValues::Positional(self.clone())
    }
}

impl<const N: usize> AsParams for [(&str, f64); N] {
    fn as_params(&self) -> ParamValues {
        ParamValues::Named(self.iter().map(|&(k, v)| (k, v)).collect())
    }
}

// Product measure draws are column-major, so flatten them the same way.
impl AsParams for ArrayD<f64> {
    fn as_params(&self) -> ParamValues {
        ParamValues::Positional(self.t().iter().copied().collect())
    }
}

/// Fixed-size view of positional parameter values.
pub(crate) fn param_array<const N: usize>(values: &[f64]) -> Result<[f64; N]> {
    <[f64; N]>::try_from(values).map_err(|_| MeasureError::ArityMismatch {
        expected: N,
        found: values.len(),
    })
}

/// A measure family with named scalar parameters.
///
/// `PARAM_NAMES` fixes the canonical order used for positional values.
pub trait ParameterizedMeasure: Measure + Sized {
    const NAME: &'static str;
    const PARAM_NAMES: &'static [&'static str];

    /// Build an instance from values in `PARAM_NAMES` order.
    ///
    /// Fails with `ArityMismatch` if the slice length differs from
    /// `PARAM_NAMES.len()`.
    fn from_param_slice(values: &[f64]) -> Result<Self>;

    fn param_values(&self) -> Vec<f64>;

    fn from_named(params: &NamedParams) -> Result<Self> {
        if let Some(name) = params
            .names()
            .find(|n| !Self::PARAM_NAMES.iter().any(|p| p == n))
        {
            return Err(MeasureError::UnknownParameter {
                family: Self::NAME,
                name: name.to_string(),
            });
        }
        let values = Self::PARAM_NAMES
            .iter()
            .map(|&name| {
                params.get(name).ok_or(MeasureError::MissingParameter {
                    family: Self::NAME,
                    name,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_param_slice(&values)
    }

    fn from_positional(values: &[f64]) -> Result<Self> {
        Self::from_param_slice(values)
    }

    fn params(&self) -> NamedParams {
        Self::PARAM_NAMES
            .iter()
            .copied()
            .zip(self.param_values())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{IxDyn, ShapeBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn display_named() {
        let p = NamedParams::from([("sigma", 3.0), ("mu", 2.0)]);
        assert_eq!(p.to_string(), "(mu = 2, sigma = 3)");
        assert_eq!(p.len(), 2);
        assert!(p.contains("mu"));
    }

    #[test]
    fn conversions() {
        assert_eq!(2.0f64.as_params(), ParamValues::Positional(vec![2.0]));
        assert_eq!(
            [("mu", 1.0f64)].as_params(),
            ParamValues::Named(NamedParams::from([("mu", 1.0)]))
        );
    }

    #[test]
    fn param_array_checks_length() {
        assert_eq!(param_array::<2>(&[1., 2.]).unwrap(), [1., 2.]);
        assert!(matches!(
            param_array::<2>(&[1.]),
            Err(MeasureError::ArityMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn array_points_flatten_column_major() {
        let x = ArrayD::from_shape_vec(IxDyn(&[2, 2]).f(), vec![1., 2., 3., 4.]).unwrap();
        assert_eq!(x.as_params(), ParamValues::Positional(vec![1., 2., 3., 4.]));
    }
}
