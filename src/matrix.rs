//! Small dense matrix library used by the Kalman estimator.
//!
//! Matrices are backed by `ndarray::Array2<f64>` and have value semantics:
//! every operation returns a freshly sized result instead of writing into an
//! operand, so a result can never alias one of its inputs.

use std::ops::{Index, IndexMut};

use ndarray::Array2;

use crate::error::MatrixError;

/// Relative pivot magnitude below which a matrix is treated as singular.
const PIVOT_EPSILON: f64 = 1e-12;

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Array2<f64>,
}

impl Matrix {
    /// Zero-initialised `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
        }
    }

    /// `n x n` identity.
    pub fn identity(n: usize) -> Self {
        Self {
            data: Array2::eye(n),
        }
    }

    /// Square matrix with `diag` on the diagonal.
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let mut m = Self::zeros(diag.len(), diag.len());
        for (i, &v) in diag.iter().enumerate() {
            m.data[[i, i]] = v;
        }
        m
    }

    /// Build a matrix from equally sized rows.
    pub fn from_rows(rows: &[&[f64]]) -> Result<Self, MatrixError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        let mut m = Self::zeros(n_rows, n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(MatrixError::DimensionMismatch {
                    op: "from_rows",
                    left: (i, n_cols),
                    right: (i, row.len()),
                });
            }
            for (j, &v) in row.iter().enumerate() {
                m.data[[i, j]] = v;
            }
        }
        Ok(m)
    }

    /// Column vector from a slice.
    pub fn column(values: &[f64]) -> Self {
        let mut m = Self::zeros(values.len(), 1);
        for (i, &v) in values.iter().enumerate() {
            m.data[[i, 0]] = v;
        }
        m
    }

    pub fn from_array(data: Array2<f64>) -> Self {
        Self { data }
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn is_square(&self) -> bool {
        self.rows() == self.cols()
    }

    /// Resize in place. Overlapping entries are kept, new entries are zero.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if self.dim() == (rows, cols) {
            return;
        }
        let mut data = Array2::zeros((rows, cols));
        for i in 0..rows.min(self.rows()) {
            for j in 0..cols.min(self.cols()) {
                data[[i, j]] = self.data[[i, j]];
            }
        }
        self.data = data;
    }

    /// Element-wise sum.
    pub fn add(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_dim("add", other)?;
        Ok(Self::from_array(&self.data + &other.data))
    }

    /// Element-wise difference.
    pub fn sub(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        self.check_same_dim("sub", other)?;
        Ok(Self::from_array(&self.data - &other.data))
    }

    /// Matrix product `self * other` (`m x k` times `k x n`).
    pub fn mul(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols() != other.rows() {
            return Err(MatrixError::DimensionMismatch {
                op: "mul",
                left: self.dim(),
                right: other.dim(),
            });
        }
        let (m, k, n) = (self.rows(), self.cols(), other.cols());
        let mut out = Array2::zeros((m, n));
        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0;
                for l in 0..k {
                    acc += self.data[[i, l]] * other.data[[l, j]];
                }
                out[[i, j]] = acc;
            }
        }
        Ok(Self::from_array(out))
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        Self::from_array(&self.data * factor)
    }

    pub fn transpose(&self) -> Matrix {
        Self::from_array(self.data.t().to_owned())
    }

    pub fn trace(&self) -> f64 {
        self.data.diag().sum()
    }

    /// Inverse by Gauss-Jordan elimination with full pivoting.
    ///
    /// Fails on non-square input and on (numerically) singular matrices.
    pub fn invert(&self) -> Result<Matrix, MatrixError> {
        let (rows, cols) = self.dim();
        if rows != cols {
            return Err(MatrixError::NotSquare { rows, cols });
        }
        let n = rows;
        let scale = self.data.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if n == 0 || scale == 0.0 || !scale.is_finite() {
            return Err(MatrixError::Singular);
        }
        let threshold = scale * PIVOT_EPSILON;

        let mut a = self.data.clone();
        let mut used = vec![false; n];
        let mut pivot_rows = vec![0usize; n];
        let mut pivot_cols = vec![0usize; n];

        for step in 0..n {
            let mut big = 0.0;
            let (mut irow, mut icol) = (0, 0);
            for j in (0..n).filter(|&j| !used[j]) {
                for k in (0..n).filter(|&k| !used[k]) {
                    let v = a[[j, k]].abs();
                    if v > big {
                        big = v;
                        irow = j;
                        icol = k;
                    }
                }
            }
            if big <= threshold {
                return Err(MatrixError::Singular);
            }
            used[icol] = true;

            if irow != icol {
                for l in 0..n {
                    a.swap([irow, l], [icol, l]);
                }
            }
            pivot_rows[step] = irow;
            pivot_cols[step] = icol;

            let pivot_inv = 1.0 / a[[icol, icol]];
            a[[icol, icol]] = 1.0;
            for l in 0..n {
                a[[icol, l]] *= pivot_inv;
            }
            for r in (0..n).filter(|&r| r != icol) {
                let factor = a[[r, icol]];
                a[[r, icol]] = 0.0;
                for l in 0..n {
                    let delta = a[[icol, l]] * factor;
                    a[[r, l]] -= delta;
                }
            }
        }

        // Undo the column interchanges in reverse order.
        for step in (0..n).rev() {
            if pivot_rows[step] != pivot_cols[step] {
                for k in 0..n {
                    a.swap([k, pivot_rows[step]], [k, pivot_cols[step]]);
                }
            }
        }

        if a.iter().any(|v| !v.is_finite()) {
            return Err(MatrixError::Singular);
        }
        Ok(Self::from_array(a))
    }

    /// Element-wise comparison with an absolute tolerance.
    pub fn approx_eq(&self, other: &Matrix, tolerance: f64) -> bool {
        self.dim() == other.dim()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    fn check_same_dim(&self, op: &'static str, other: &Matrix) -> Result<(), MatrixError> {
        if self.dim() != other.dim() {
            return Err(MatrixError::DimensionMismatch {
                op,
                left: self.dim(),
                right: other.dim(),
            });
        }
        Ok(())
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        &self.data[[r, c]]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        &mut self.data[[r, c]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Matrix {
        Matrix::from_rows(&[&[4.0, 7.0, 2.0], &[3.0, 6.0, 1.0], &[2.0, 5.0, 3.0]]).unwrap()
    }

    #[test]
    fn test_zeros_and_identity() {
        let z = Matrix::zeros(2, 3);
        assert_eq!(z.dim(), (2, 3));
        assert!(z.as_array().iter().all(|&v| v == 0.0));

        let i = Matrix::identity(3);
        assert_eq!(i.trace(), 3.0);
        assert_eq!(i[(0, 1)], 0.0);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Matrix::from_rows(&[&[1.0, 2.0], &[3.0]]).unwrap_err();
        assert!(matches!(err, MatrixError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_resize_keeps_overlap() {
        let mut m = sample();
        m.resize(2, 4);
        assert_eq!(m.dim(), (2, 4));
        assert_eq!(m[(1, 1)], 6.0);
        assert_eq!(m[(1, 3)], 0.0);
    }

    #[test]
    fn test_add_sub() {
        let a = sample();
        let b = Matrix::identity(3);
        let sum = a.add(&b).unwrap();
        assert_eq!(sum[(0, 0)], 5.0);
        let back = sum.sub(&b).unwrap();
        assert_eq!(back, a);

        let err = a.add(&Matrix::zeros(2, 2)).unwrap_err();
        assert!(matches!(err, MatrixError::DimensionMismatch { op: "add", .. }));
    }

    #[test]
    fn test_mul_shapes() {
        let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]).unwrap();
        let b = Matrix::from_rows(&[&[7.0, 8.0], &[9.0, 10.0], &[11.0, 12.0]]).unwrap();
        let c = a.mul(&b).unwrap();
        assert_eq!(c.dim(), (2, 2));
        assert_eq!(c[(0, 0)], 58.0);
        assert_eq!(c[(0, 1)], 64.0);
        assert_eq!(c[(1, 0)], 139.0);
        assert_eq!(c[(1, 1)], 154.0);

        assert!(a.mul(&a).is_err());
    }

    #[test]
    fn test_transpose() {
        let a = Matrix::from_rows(&[&[1.0, 2.0, 3.0]]).unwrap();
        let t = a.transpose();
        assert_eq!(t.dim(), (3, 1));
        assert_eq!(t[(2, 0)], 3.0);
    }

    #[test]
    fn test_invert_known() {
        let m = sample();
        let inv = m.invert().unwrap();
        let prod = m.mul(&inv).unwrap();
        assert!(prod.approx_eq(&Matrix::identity(3), 1e-10));
    }

    #[test]
    fn test_invert_needs_pivoting() {
        // Zero on the leading diagonal entry.
        let m = Matrix::from_rows(&[&[0.0, 1.0], &[1.0, 0.0]]).unwrap();
        let inv = m.invert().unwrap();
        assert!(inv.approx_eq(&m, 1e-12));
    }

    #[test]
    fn test_invert_singular() {
        let m = Matrix::from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]).unwrap();
        assert_eq!(m.invert().unwrap_err(), MatrixError::Singular);
        assert_eq!(Matrix::zeros(3, 3).invert().unwrap_err(), MatrixError::Singular);
    }

    #[test]
    fn test_invert_not_square() {
        let err = Matrix::zeros(2, 3).invert().unwrap_err();
        assert_eq!(err, MatrixError::NotSquare { rows: 2, cols: 3 });
    }

    fn diagonally_dominant(n: usize) -> impl Strategy<Value = Matrix> {
        prop::collection::vec(-1.0f64..1.0, n * n).prop_map(move |values| {
            let mut m = Matrix::zeros(n, n);
            for i in 0..n {
                for j in 0..n {
                    m[(i, j)] = values[i * n + j];
                }
                m[(i, i)] += n as f64 + 1.0;
            }
            m
        })
    }

    proptest! {
        #[test]
        fn prop_double_inverse_round_trips(m in (1usize..7).prop_flat_map(diagonally_dominant)) {
            let inv = m.invert().unwrap();
            let back = inv.invert().unwrap();
            prop_assert!(back.approx_eq(&m, 1e-9));
        }

        #[test]
        fn prop_product_with_inverse_is_identity(m in (1usize..7).prop_flat_map(diagonally_dominant)) {
            let inv = m.invert().unwrap();
            let prod = m.mul(&inv).unwrap();
            prop_assert!(prod.approx_eq(&Matrix::identity(m.rows()), 1e-9));
        }
    }
}
