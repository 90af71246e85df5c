use std::fmt;

use itertools::Itertools;

use crate::math::column_major_coords;
use crate::measure::{MeasureError, Result};

/// Which kind of index a product measure was built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Grid,
    Zipped,
    Lazy,
}

/// Number of elements of an index source, if it is known to be finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    Finite(usize),
    Unbounded,
}

/// How zipped index columns of different lengths are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZipPolicy {
    /// Columns of different length are a `ShapeMismatch`.
    #[default]
    Strict,
    /// Use the length of the shortest column.
    Truncate,
}

/// A finite, random-access set of index tuples.
///
/// Positions are zero-based and enumerate the index shape in column-major
/// order (the first dimension varies fastest).
pub trait IndexSource {
    type Item: Clone;

    fn kind(&self) -> IndexKind;

    fn shape(&self) -> &[usize];

    fn len(&self) -> usize {
        self.shape().iter().product()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn extent(&self) -> Extent {
        Extent::Finite(self.len())
    }

    /// Write the arguments for position `pos` into `out`.
    ///
    /// `out` is cleared first. Returns `false` if `pos` is out of range.
    fn write_index(&self, pos: usize, out: &mut Vec<Self::Item>) -> bool;

    fn index_at(&self, pos: usize) -> Option<Vec<Self::Item>> {
        let mut out = Vec::new();
        if self.write_index(pos, &mut out) {
            Some(out)
        } else {
            None
        }
    }

    fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

/// The grid `{1..d1} × … × {1..dk}`. Coordinates handed out are one-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridIndex {
    dims: Vec<usize>,
    len: usize,
}

impl GridIndex {
    /// Fails with `InvalidDimension` if `dims` is empty, has a zero entry,
    /// or has more cells than fit in a `usize`.
    pub fn new(dims: &[usize]) -> Result<GridIndex> {
        let len = match dims {
            [] => None,
            _ => dims
                .iter()
                .try_fold(1usize, |acc, &d| acc.checked_mul(d))
                .filter(|&len| len > 0),
        };
        let len = len.ok_or_else(|| MeasureError::InvalidDimension(dims.to_vec()))?;
        Ok(GridIndex {
            dims: dims.to_vec(),
            len,
        })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }
}

impl IndexSource for GridIndex {
    type Item = usize;

    fn kind(&self) -> IndexKind {
        IndexKind::Grid
    }

    fn shape(&self) -> &[usize] {
        &self.dims
    }

    fn len(&self) -> usize {
        self.len
    }

    fn write_index(&self, pos: usize, out: &mut Vec<usize>) -> bool {
        out.clear();
        if pos >= self.len() {
            return false;
        }
        out.resize(self.dims.len(), 0);
        column_major_coords(pos, &self.dims, out);
        out.iter_mut().for_each(|c| *c += 1);
        true
    }

    fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dims.iter().join(", "))
    }
}

/// Several borrowed columns traversed in lock-step.
#[derive(Debug, Clone)]
pub struct ZippedIndex<'a, T> {
    columns: Vec<&'a [T]>,
    shape: [usize; 1],
}

impl<'a, T> ZippedIndex<'a, T> {
    pub fn new(columns: Vec<&'a [T]>, policy: ZipPolicy) -> Result<ZippedIndex<'a, T>> {
        let lengths = columns.iter().map(|c| c.len()).collect::<Vec<_>>();
        let len = match lengths.iter().min() {
            Some(&len) => len,
            None => return Err(MeasureError::EmptyIndex),
        };
        if policy == ZipPolicy::Strict && lengths.iter().any(|&l| l != len) {
            return Err(MeasureError::ShapeMismatch {
                expected: vec![len; lengths.len()],
                found: lengths,
            });
        }
        Ok(ZippedIndex {
            columns,
            shape: [len],
        })
    }

    pub fn columns(&self) -> &[&'a [T]] {
        &self.columns
    }
}

impl<T: Clone + fmt::Debug> IndexSource for ZippedIndex<'_, T> {
    type Item = T;

    fn kind(&self) -> IndexKind {
        IndexKind::Zipped
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn write_index(&self, pos: usize, out: &mut Vec<T>) -> bool {
        out.clear();
        if pos >= self.shape[0] {
            return false;
        }
        out.extend(self.columns.iter().map(|c| c[pos].clone()));
        true
    }

    fn describe(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.shape[0];
        write!(
            f,
            "{}",
            self.columns
                .iter()
                .map(|c| format!("{:?}", &c[..len]))
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn grid_enumerates_first_dimension_fastest() {
        let grid = GridIndex::new(&[2, 3]).unwrap();
        let all = (0..grid.len())
            .map(|pos| grid.index_at(pos).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            all,
            vec![
                vec![1, 1],
                vec![2, 1],
                vec![1, 2],
                vec![2, 2],
                vec![1, 3],
                vec![2, 3]
            ]
        );
        assert_eq!(grid.index_at(6), None);
        assert_eq!(grid.extent(), Extent::Finite(6));
    }

    #[test]
    fn grid_rejects_zero_dims() {
        assert!(matches!(
            GridIndex::new(&[3, 0]),
            Err(MeasureError::InvalidDimension(_))
        ));
        assert!(matches!(
            GridIndex::new(&[]),
            Err(MeasureError::InvalidDimension(_))
        ));
    }

    #[test]
    fn grid_rejects_overflowing_size() {
        assert!(matches!(
            GridIndex::new(&[usize::MAX, 2]),
            Err(MeasureError::InvalidDimension(_))
        ));
        let big = GridIndex::new(&[usize::MAX, 1]).unwrap();
        assert_eq!(big.len(), usize::MAX);
        assert_eq!(big.index_at(usize::MAX - 1), Some(vec![usize::MAX, 1]));
    }

    #[test]
    fn zip_policies() {
        let a = [1, 2, 3];
        let b = [4, 5];
        assert!(matches!(
            ZippedIndex::new(vec![&a[..], &b[..]], ZipPolicy::Strict),
            Err(MeasureError::ShapeMismatch { .. })
        ));
        let zipped = ZippedIndex::new(vec![&a[..], &b[..]], ZipPolicy::Truncate).unwrap();
        assert_eq!(zipped.len(), 2);
        assert_eq!(zipped.index_at(1), Some(vec![2, 5]));
        assert_eq!(zipped.index_at(2), None);
    }

    #[test]
    fn zip_needs_columns() {
        let columns: Vec<&[f64]> = vec![];
        assert!(matches!(
            ZippedIndex::new(columns, ZipPolicy::Strict),
            Err(MeasureError::EmptyIndex)
        ));
    }

    proptest! {
        #[test]
        fn grid_len_is_product(dims in proptest::collection::vec(1usize..6, 1..4)) {
            let grid = GridIndex::new(&dims).unwrap();
            prop_assert_eq!(grid.len(), dims.iter().product::<usize>());
            let last = grid.index_at(grid.len() - 1).unwrap();
            prop_assert_eq!(last, dims.clone());
        }
    }
}
