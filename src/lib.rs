pub(crate) mod families;
pub(crate) mod index;
pub(crate) mod lazy_product;
pub(crate) mod likelihood;
pub(crate) mod math;
pub(crate) mod measure;
pub(crate) mod params;
pub(crate) mod posterior;
pub(crate) mod product;

pub use families::{Exponential, Normal, Poisson};
pub use index::{Extent, GridIndex, IndexKind, IndexSource, ZipPolicy, ZippedIndex};
pub use lazy_product::LazyProduct;
pub use likelihood::{Likelihood, LogLikelihood};
pub use measure::{BaseMeasure, Density, Measure, MeasureError, Result, VarTransform};
pub use params::{AsParams, NamedParams, ParamValues, ParameterizedMeasure};
pub use posterior::Posterior;
pub use product::{For, ProductMeasure, ProductSettings};
