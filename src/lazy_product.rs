use std::borrow::Borrow;
use std::fmt;
use std::iter::{Fuse, Peekable};

use itertools::{EitherOrBoth, Itertools};
use log::debug;

use crate::index::{Extent, IndexKind};
use crate::measure::{Measure, MeasureError, Result};

/// A product measure over a lazy source.
///
/// The source is pulled once: after the elements have been iterated, summed
/// or sampled they are gone, and further iteration yields nothing. Products
/// created with `For::restartable` keep a copy of the untouched source and
/// can be put back to the start with `rewind`.
pub struct LazyProduct<I: Iterator, F> {
    source: Peekable<Fuse<I>>,
    pristine: Option<I>,
    f: F,
    consumed: usize,
    label: Option<String>,
}

impl<I, F, M> LazyProduct<I, F>
where
    I: Iterator,
    F: Fn(I::Item) -> M,
    M: Measure,
{
    pub(crate) fn new(source: I, f: F) -> Self {
        LazyProduct {
            source: source.fuse().peekable(),
            pristine: None,
            f,
            consumed: 0,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn kind(&self) -> IndexKind {
        IndexKind::Lazy
    }

    /// Remaining number of elements, if the source reports an exact size.
    pub fn extent(&self) -> Extent {
        match self.source.size_hint() {
            (lower, Some(upper)) if lower == upper => Extent::Finite(lower),
            _ => Extent::Unbounded,
        }
    }

    /// Number of elements already pulled from the source.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn is_exhausted(&mut self) -> bool {
        self.source.peek().is_none()
    }

    pub fn is_restartable(&self) -> bool {
        self.pristine.is_some()
    }

    pub fn next_measure(&mut self) -> Option<M> {
        let item = self.source.next()?;
        self.consumed += 1;
        Some((self.f)(item))
    }

    /// Remaining elements, consuming the source as they are pulled.
    pub fn iter(&mut self) -> impl Iterator<Item = M> + '_ {
        std::iter::from_fn(move || self.next_measure())
    }

    fn fold_with<X>(
        &mut self,
        xs: X,
        g: impl Fn(&M, &M::Point) -> Result<f64>,
    ) -> Result<f64>
    where
        X: IntoIterator,
        X::Item: Borrow<M::Point>,
    {
        let mut total = 0f64;
        for (i, pair) in self.iter().zip_longest(xs).enumerate() {
            match pair {
                EitherOrBoth::Both(elem, x) => total += g(&elem, x.borrow())?,
                EitherOrBoth::Left(_) => {
                    return Err(MeasureError::ShapeMismatch {
                        expected: vec![i + 1],
                        found: vec![i],
                    })
                }
                EitherOrBoth::Right(_) => {
                    return Err(MeasureError::ShapeMismatch {
                        expected: vec![i],
                        found: vec![i + 1],
                    })
                }
            }
        }
        Ok(total)
    }

    /// Sum of element log-densities, folded over the source and `xs` in
    /// lock-step without collecting either.
    ///
    /// If one side ends before the other the result is a `ShapeMismatch`
    /// whose `expected`/`found` give the lengths seen so far. With an
    /// infinite source and an infinite `xs` this never returns.
    pub fn logdensity<X>(&mut self, xs: X) -> Result<f64>
    where
        X: IntoIterator,
        X::Item: Borrow<M::Point>,
    {
        self.fold_with(xs, |elem, x| elem.logdensity(x))
    }

    pub fn logdensity_rel<X>(&mut self, xs: X) -> Result<f64>
    where
        X: IntoIterator,
        X::Item: Borrow<M::Point>,
    {
        self.fold_with(xs, |elem, x| elem.logdensity_rel(x))
    }

    /// Lazy independent draws, one per remaining element.
    pub fn sample_iter<'a, R>(
        &'a mut self,
        rng: &'a mut R,
    ) -> impl Iterator<Item = Result<M::Point>> + 'a
    where
        R: rand::Rng + ?Sized,
    {
        self.iter().map(move |elem| elem.sample(rng))
    }
}

impl<I, F, M> LazyProduct<I, F>
where
    I: Iterator + Clone,
    F: Fn(I::Item) -> M,
    M: Measure,
{
    pub(crate) fn restartable(source: I, f: F) -> Self {
        let mut product = LazyProduct::new(source.clone(), f);
        product.pristine = Some(source);
        product
    }

    /// Start again from the first element.
    ///
    /// Fails with `NotRestartable` unless built with `For::restartable`.
    pub fn rewind(&mut self) -> Result<()> {
        let pristine = self.pristine.as_ref().ok_or(MeasureError::NotRestartable)?;
        debug!("rewinding lazy product after {} elements", self.consumed);
        self.source = pristine.clone().fuse().peekable();
        self.consumed = 0;
        Ok(())
    }
}

impl<I: Iterator, F> fmt::Display for LazyProduct<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match &self.label {
            Some(label) => label.as_str(),
            None => std::any::type_name::<F>(),
        };
        write!(f, "For({}, <lazy>)", label)
    }
}

#[cfg(test)]
mod tests {
    use crate::families::{Exponential, Normal};
    use crate::index::Extent;
    use crate::measure::{Density, MeasureError};
    use crate::product::For;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;

    #[test]
    fn generator_transform_runs_before_f() {
        let mut p = For::lazy((1..).map(|i| i as f64 * 0.5), Exponential::new);
        assert_eq!(p.next_measure(), Some(Exponential::new(0.5)));
        assert_eq!(p.next_measure(), Some(Exponential::new(1.0)));
        assert_eq!(p.consumed(), 2);
        assert_eq!(p.extent(), Extent::Unbounded);
    }

    #[test]
    fn logdensity_folds_elements() {
        let mut p = For::lazy(1..=3, |i: i32| Exponential::new(i as f64));
        assert_eq!(p.extent(), Extent::Finite(3));
        let xs = [1.0, 0.5, 2.0];
        let expected: f64 = xs
            .iter()
            .enumerate()
            .map(|(i, x)| Exponential::new((i + 1) as f64).logdensity(x).unwrap())
            .sum();
        assert_abs_diff_eq!(p.logdensity(xs).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn length_mismatch() {
        let mut p = For::lazy(1..=3, |i: i32| Exponential::new(i as f64));
        assert!(matches!(
            p.logdensity([1.0, 2.0]),
            Err(MeasureError::ShapeMismatch { .. })
        ));
        let mut p = For::lazy(1..=2, |i: i32| Exponential::new(i as f64));
        assert!(matches!(
            p.logdensity(vec![1.0, 2.0, 3.0]),
            Err(MeasureError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn infinite_source_bounded_by_caller() {
        let mut p = For::lazy((1..).map(|i| i as f64), |mu| Normal::new(mu, 1.));
        let xs = [1.0, 2.0, 3.0];
        let lp = p.logdensity_rel(xs.iter().copied().take(3));
        // The source is still producing when the observations end.
        assert!(lp.is_err());
        let mut p = For::lazy((1..).map(|i| i as f64).take(3), |mu| Normal::new(mu, 1.));
        assert_abs_diff_eq!(p.logdensity_rel(&xs).unwrap(), 0., epsilon = 1e-12);
    }

    #[test]
    fn single_pass() {
        let mut p = For::lazy(vec![1., 2., 3.], Exponential::new);
        assert_eq!(p.iter().count(), 3);
        assert!(p.is_exhausted());
        assert_eq!(p.iter().count(), 0);
        assert_eq!(p.next_measure(), None);
        assert!(matches!(p.rewind(), Err(MeasureError::NotRestartable)));
    }

    #[test]
    fn restartable_source_replays() {
        let mut p = For::restartable(vec![1., 2., 3.], Exponential::new);
        assert!(p.is_restartable());
        let first = p.iter().collect::<Vec<_>>();
        assert_eq!(p.iter().count(), 0);
        p.rewind().unwrap();
        assert_eq!(p.consumed(), 0);
        assert_eq!(p.iter().collect::<Vec<_>>(), first);
    }

    #[test]
    fn sample_lazily() {
        let mut p = For::lazy((1..).map(|i| i as f64), Exponential::new);
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let draws = p
            .sample_iter(&mut rng)
            .take(4)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(draws.len(), 4);
        assert!(draws.iter().all(|&x| x >= 0.));
        assert_eq!(p.consumed(), 4);
    }

    #[test]
    fn display() {
        let p = For::lazy(0..4, |i: i32| Exponential::new(i as f64)).with_label("rate");
        assert_eq!(p.to_string(), "For(rate, <lazy>)");
    }
}
