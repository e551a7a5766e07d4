//! Row-major 2-D containers for masks and control-point grids.
use std::ops::{Index, IndexMut};

/// A dense row-major 2-D array.
///
/// The flat index `i * cols + j` maps to the logical element `(i, j)`.
///
/// ```
/// use pnspline::Grid;
///
/// let grid = Grid::from_vec(2, 3, vec![0, 1, 2, 3, 4, 5]).unwrap();
/// assert_eq!(grid[(1, 2)], 5);
/// assert_eq!(grid.row(1), &[3, 4, 5]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// A linear map from flattened stencil coordinates to flattened Bézier
/// control-point coordinates.
pub type Mask = Grid<f64>;

impl<T: Clone + Default> Grid<T> {
    /// Create a `rows × cols` grid filled with `T::default()`.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }
}

impl<T> Grid<T> {
    /// Wrap a flat row-major buffer. Returns `None` when `data.len() != rows *
    /// cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { rows, cols, data })
    }

    /// Build a grid by calling `f(i, j)` for every element in row-major order.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element `(i, j)`, or `None` if out of bounds.
    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        (i < self.rows && j < self.cols).then(|| &self.data[i * self.cols + j])
    }

    /// Row `i` as a slice.
    ///
    /// # Panics
    ///
    /// If `i >= rows`.
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Iterate over the rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[T]> {
        // `chunks_exact(0)` panics.
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// The flat row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(i < self.rows && j < self.cols, "grid index ({i}, {j}) out of bounds");
        &self.data[i * self.cols + j]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        assert!(i < self.rows && j < self.cols, "grid index ({i}, {j}) out of bounds");
        &mut self.data[i * self.cols + j]
    }
}

impl Mask {
    /// Apply the mask to a flat input vector: `out = self · input`.
    ///
    /// # Panics
    ///
    /// If `input.len() != cols`.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        assert_eq!(input.len(), self.cols, "mask input length mismatch");
        self.iter_rows()
            .map(|row| row.iter().zip(input).map(|(m, x)| m * x).sum())
            .collect()
    }

    /// Matrix product `self · rhs`.
    pub(crate) fn mul(&self, rhs: &Mask) -> Mask {
        debug_assert_eq!(self.cols, rhs.rows);
        let mut out = Mask::new(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..rhs.cols {
                    out.data[i * rhs.cols + j] += a * rhs.data[k * rhs.cols + j];
                }
            }
        }
        out
    }

    /// Expand a scalar mask acting on points into the coordinate-wise mask
    /// acting on flattened `xyz` triples (`self ⊗ I₃`).
    pub(crate) fn expand_xyz(&self) -> Mask {
        let mut out = Mask::new(3 * self.rows, 3 * self.cols);
        for i in 0..self.rows {
            for j in 0..self.cols {
                let w = self.data[i * self.cols + j];
                for k in 0..3 {
                    out[(3 * i + k, 3 * j + k)] = w;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_mapping() {
        let grid = Grid::from_fn(3, 4, |i, j| i * 4 + j);
        for (flat, value) in grid.as_slice().iter().enumerate() {
            assert_eq!(flat, *value);
        }
        assert_eq!(grid[(2, 1)], 9);
        assert_eq!(grid.get(3, 0), None);
    }

    #[test]
    fn apply_and_mul() {
        let a = Mask::from_vec(2, 2, vec![1.0, 2.0, 0.0, 1.0]).unwrap();
        let b = Mask::from_vec(2, 1, vec![3.0, 4.0]).unwrap();
        assert_eq!(a.mul(&b).into_vec(), vec![11.0, 4.0]);
        assert_eq!(a.apply(&[3.0, 4.0]), vec![11.0, 4.0]);
    }

    #[test]
    fn expand_xyz_acts_per_coordinate() {
        let half = Mask::from_vec(1, 2, vec![0.5, 0.5]).unwrap();
        let expanded = half.expand_xyz();
        assert_eq!(expanded.shape(), (3, 6));
        let out = expanded.apply(&[0.0, 2.0, 4.0, 2.0, 4.0, 6.0]);
        assert_eq!(out, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn from_vec_checks_length() {
        assert!(Grid::from_vec(2, 2, vec![0u8; 3]).is_none());
    }
}
