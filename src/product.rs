//! Product measures built by mapping a function over an index source.
//!
//! `For::grid`, `For::zip` and `For::lazy` pick the index source; elements
//! are never stored, every access calls the mapping function again.

use std::fmt;

use log::debug;
use ndarray::{ArrayD, IxDyn, ShapeBuilder};

use crate::index::{Extent, GridIndex, IndexKind, IndexSource, ZipPolicy, ZippedIndex};
use crate::lazy_product::LazyProduct;
use crate::math::column_major_pos;
use crate::measure::{BaseMeasure, Density, Measure, MeasureError, Result, VarTransform};

/// Settings for building product measures.
#[derive(Debug, Clone, Copy)]
pub struct ProductSettings {
    /// What to do with zipped columns of different length.
    pub zip_policy: ZipPolicy,
    /// Check that every element shares the base measure of the first one.
    pub validate_base_measure: bool,
}

impl Default for ProductSettings {
    fn default() -> Self {
        Self {
            zip_policy: ZipPolicy::Strict,
            validate_base_measure: true,
        }
    }
}

/// Constructors for product measures.
pub struct For;

impl For {
    /// Product over the grid `{1..d1} × … × {1..dk}`.
    ///
    /// `f` receives the one-based coordinates of each grid cell.
    pub fn grid<M, F>(dims: &[usize], f: F) -> Result<ProductMeasure<GridIndex, F>>
    where
        M: Measure,
        F: Fn(&[usize]) -> M,
    {
        Self::grid_with(dims, f, ProductSettings::default())
    }

    pub fn grid_with<M, F>(
        dims: &[usize],
        f: F,
        settings: ProductSettings,
    ) -> Result<ProductMeasure<GridIndex, F>>
    where
        M: Measure,
        F: Fn(&[usize]) -> M,
    {
        let index = GridIndex::new(dims)?;
        debug!("building grid product measure over {:?}", dims);
        Ok(ProductMeasure::new(index, f, settings))
    }

    /// One-dimensional grid over `1..=n`.
    pub fn range<M, F>(
        n: usize,
        f: F,
    ) -> Result<ProductMeasure<GridIndex, impl Fn(&[usize]) -> M>>
    where
        M: Measure,
        F: Fn(usize) -> M,
    {
        Self::grid(&[n], move |i: &[usize]| f(i[0]))
    }

    /// Product over columns traversed in lock-step; element `i` is
    /// `f(&[columns[0][i], columns[1][i], …])`.
    pub fn zip<'a, T, M, F>(
        columns: Vec<&'a [T]>,
        f: F,
    ) -> Result<ProductMeasure<ZippedIndex<'a, T>, F>>
    where
        T: Clone + fmt::Debug,
        M: Measure,
        F: Fn(&[T]) -> M,
    {
        Self::zip_with(columns, f, ProductSettings::default())
    }

    pub fn zip_with<'a, T, M, F>(
        columns: Vec<&'a [T]>,
        f: F,
        settings: ProductSettings,
    ) -> Result<ProductMeasure<ZippedIndex<'a, T>, F>>
    where
        T: Clone + fmt::Debug,
        M: Measure,
        F: Fn(&[T]) -> M,
    {
        let index = ZippedIndex::new(columns, settings.zip_policy)?;
        debug!(
            "building zipped product measure over {} columns of length {}",
            index.columns().len(),
            index.len()
        );
        Ok(ProductMeasure::new(index, f, settings))
    }

    /// Single-pass product over a lazy, possibly infinite source.
    ///
    /// Any transformation already attached to the source (`map` and friends)
    /// runs before `f`.
    pub fn lazy<I, M, F>(source: I, f: F) -> LazyProduct<I::IntoIter, F>
    where
        I: IntoIterator,
        M: Measure,
        F: Fn(I::Item) -> M,
    {
        LazyProduct::new(source.into_iter(), f)
    }

    /// Like `For::lazy`, but the source is cloned before iterating so the
    /// product can be rewound.
    pub fn restartable<I, M, F>(source: I, f: F) -> LazyProduct<I::IntoIter, F>
    where
        I: IntoIterator,
        I::IntoIter: Clone,
        M: Measure,
        F: Fn(I::Item) -> M,
    {
        LazyProduct::restartable(source.into_iter(), f)
    }
}

/// A product of independent measures over a finite index source.
pub struct ProductMeasure<S, F> {
    index: S,
    f: F,
    settings: ProductSettings,
    label: Option<String>,
}

impl<S, F, M> ProductMeasure<S, F>
where
    S: IndexSource,
    F: Fn(&[S::Item]) -> M,
    M: Measure,
{
    fn new(index: S, f: F, settings: ProductSettings) -> Self {
        ProductMeasure {
            index,
            f,
            settings,
            label: None,
        }
    }

    /// Name shown for the mapping function in `Display`.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn shape(&self) -> &[usize] {
        self.index.shape()
    }

    pub fn kind(&self) -> IndexKind {
        self.index.kind()
    }

    pub fn extent(&self) -> Extent {
        self.index.extent()
    }

    pub fn index(&self) -> &S {
        &self.index
    }

    pub fn settings(&self) -> &ProductSettings {
        &self.settings
    }

    /// Element at the zero-based, column-major position `pos`.
    pub fn get(&self, pos: usize) -> Option<M> {
        self.index.index_at(pos).map(|idx| (self.f)(&idx))
    }

    /// All elements in column-major order.
    pub fn iter(&self) -> impl Iterator<Item = M> + '_ {
        let mut idx = Vec::new();
        (0..self.len()).map(move |pos| {
            let in_range = self.index.write_index(pos, &mut idx);
            debug_assert!(in_range, "index source rejected position {pos} below its len");
            (self.f)(&idx)
        })
    }

    fn check_shape<T>(&self, x: &ArrayD<T>) -> Result<()> {
        if x.shape() != self.shape() {
            return Err(MeasureError::ShapeMismatch {
                expected: self.shape().to_vec(),
                found: x.shape().to_vec(),
            });
        }
        Ok(())
    }

    /// Pairs every element with the matching entry of `x`.
    fn fold_elements(
        &self,
        x: &ArrayD<M::Point>,
        mut g: impl FnMut(&M, &M::Point) -> Result<f64>,
    ) -> Result<f64> {
        self.check_shape(x)?;
        let mut coords = vec![0; self.shape().len()];
        let mut total = 0f64;
        for (pos, elem) in self.iter().enumerate() {
            crate::math::column_major_coords(pos, self.shape(), &mut coords);
            total += g(&elem, &x[IxDyn(&coords)])?;
        }
        Ok(total)
    }
}

impl<F, M> ProductMeasure<GridIndex, F>
where
    F: Fn(&[usize]) -> M,
    M: Measure,
{
    /// Element at one-based grid coordinates, the same ones `f` receives.
    pub fn at(&self, coords: &[usize]) -> Option<M> {
        if coords.contains(&0) {
            return None;
        }
        let zero_based = coords.iter().map(|c| c - 1).collect::<Vec<_>>();
        column_major_pos(&zero_based, self.shape()).and_then(|pos| self.get(pos))
    }
}

impl<S, F, M> Density for ProductMeasure<S, F>
where
    S: IndexSource,
    F: Fn(&[S::Item]) -> M,
    M: Measure,
{
    type Point = ArrayD<M::Point>;

    fn logdensity_rel(&self, x: &Self::Point) -> Result<f64> {
        self.fold_elements(x, |elem, xi| elem.logdensity_rel(xi))
    }

    /// Sum of the element log-densities, each with its own base measure
    /// constants. Unlike `logdensity_rel` this does not need the elements
    /// to share a base measure.
    fn logdensity(&self, x: &Self::Point) -> Result<f64> {
        self.fold_elements(x, |elem, xi| elem.logdensity(xi))
    }

    fn basemeasure(&self) -> Result<BaseMeasure> {
        let mut elements = self.iter();
        let first = elements.next().ok_or(MeasureError::EmptyIndex)?.basemeasure()?;
        if self.settings.validate_base_measure {
            for (i, elem) in elements.enumerate() {
                if elem.basemeasure()? != first {
                    return Err(MeasureError::HeterogeneousBaseMeasure { position: i + 1 });
                }
            }
        } else {
            debug!("skipping base measure validation for {} elements", self.len());
        }
        Ok(BaseMeasure::power(first, self.shape()))
    }
}

impl<S, F, M> Measure for ProductMeasure<S, F>
where
    S: IndexSource,
    F: Fn(&[S::Item]) -> M,
    M: Measure,
{
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Result<Self::Point> {
        let draws = self
            .iter()
            .map(|elem| elem.sample(rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(ArrayD::from_shape_vec(IxDyn(self.shape()).f(), draws)?)
    }

    fn transform(&self) -> Result<VarTransform> {
        let first = self.get(0).ok_or(MeasureError::EmptyIndex)?;
        Ok(VarTransform::Array {
            element: Box::new(first.transform()?),
            shape: self.shape().to_vec(),
        })
    }
}

impl<S, F> fmt::Display for ProductMeasure<S, F>
where
    S: IndexSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match &self.label {
            Some(label) => label.as_str(),
            None => std::any::type_name::<F>(),
        };
        write!(f, "For({}, ", label)?;
        self.index.describe(f)?;
        write!(f, ")")
    }
}
