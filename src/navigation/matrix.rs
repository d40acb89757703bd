//! Runtime sized matrix, backed by [DMatrix]
use nalgebra::{DMatrix, DVector};

use crate::error::Error;

/// Cholesky factors smaller than this are considered null
const SINGULARITY_THRESHOLD: f64 = 1.0E-12;

/// Dense [Matrix] of f64, sized at runtime. Column vectors are (n, 1) [Matrix].
/// Unlike raw [DMatrix] operators, dimension mismatches are reported
/// as [Error::MatrixDimension] instead of panicking.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix(DMatrix<f64>);

impl Matrix {
    /// Creates a (rows, cols) null [Matrix]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self(DMatrix::zeros(rows, cols))
    }

    /// Creates a (n, n) identity [Matrix]
    pub fn identity(n: usize) -> Self {
        Self(DMatrix::identity(n, n))
    }

    /// Creates a square [Matrix] from its diagonal
    pub fn from_diagonal(diagonal: &[f64]) -> Self {
        Self(DMatrix::from_diagonal(&DVector::from_column_slice(diagonal)))
    }

    /// Creates a [Matrix] from rows. All rows must share the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, Error> {
        let cols = rows.first().map(|r| r.len()).unwrap_or_default();
        if rows.iter().any(|r| r.len() != cols) {
            return Err(Error::MatrixDimension);
        }
        let data = rows.iter().flatten().copied().collect::<Vec<_>>();
        Ok(Self(DMatrix::from_row_slice(rows.len(), cols, &data)))
    }

    /// Creates a column vector
    pub fn column(values: &[f64]) -> Self {
        Self(DMatrix::from_column_slice(values.len(), 1, values))
    }

    pub fn nrows(&self) -> usize {
        self.0.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.0.ncols()
    }

    /// Returns (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.0.shape()
    }

    /// Content, in row major order
    pub fn row_major(&self) -> Vec<f64> {
        self.0.transpose().as_slice().to_vec()
    }

    /// Underlying [DMatrix]
    pub fn as_dmatrix(&self) -> &DMatrix<f64> {
        &self.0
    }

    /// True when all terms are finite
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Diagonal terms
    pub fn diagonal(&self) -> Vec<f64> {
        self.0.diagonal().iter().copied().collect()
    }

    /// Euclidean (Frobenius) norm
    pub fn norm(&self) -> f64 {
        self.0.norm()
    }

    pub fn transpose(&self) -> Self {
        Self(self.0.transpose())
    }

    /// Matrix product self * rhs
    pub fn mul(&self, rhs: &Self) -> Result<Self, Error> {
        if self.ncols() != rhs.nrows() {
            return Err(Error::MatrixDimension);
        }
        Ok(Self(&self.0 * &rhs.0))
    }

    /// Term by term sum
    pub fn add(&self, rhs: &Self) -> Result<Self, Error> {
        if self.shape() != rhs.shape() {
            return Err(Error::MatrixDimension);
        }
        Ok(Self(&self.0 + &rhs.0))
    }

    /// Term by term difference
    pub fn sub(&self, rhs: &Self) -> Result<Self, Error> {
        if self.shape() != rhs.shape() {
            return Err(Error::MatrixDimension);
        }
        Ok(Self(&self.0 - &rhs.0))
    }

    /// Inverse of a square [Matrix] (LU decomposition)
    pub fn inverse(&self) -> Result<Self, Error> {
        if self.nrows() != self.ncols() {
            return Err(Error::MatrixDimension);
        }
        let inv = self
            .0
            .clone()
            .try_inverse()
            .ok_or(Error::MatrixInversion)?;

        if inv.iter().any(|v| !v.is_finite()) {
            return Err(Error::MatrixInversion);
        }

        Ok(Self(inv))
    }

    /// Inverse of a symmetric positive definite [Matrix], by Cholesky decomposition
    pub fn cholesky_inverse(&self) -> Result<Self, Error> {
        if self.nrows() != self.ncols() {
            return Err(Error::MatrixDimension);
        }

        let cholesky = self.0.clone().cholesky().ok_or(Error::MatrixInversion)?;

        if cholesky
            .l_dirty()
            .diagonal()
            .iter()
            .any(|l| !l.is_finite() || *l <= SINGULARITY_THRESHOLD)
        {
            return Err(Error::MatrixInversion);
        }

        Ok(Self(cholesky.inverse()))
    }
}

impl From<DMatrix<f64>> for Matrix {
    fn from(m: DMatrix<f64>) -> Self {
        Self(m)
    }
}

impl std::ops::Index<(usize, usize)> for Matrix {
    type Output = f64;
    fn index(&self, index: (usize, usize)) -> &f64 {
        &self.0[index]
    }
}

impl std::ops::IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        &mut self.0[index]
    }
}
