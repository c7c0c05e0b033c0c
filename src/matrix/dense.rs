//! Dense matrix-product operators on top of Faer.
//!
//! These adapters borrow a `faer` matrix and expose it through `LinearOperator`. The general
//! variant uses every entry; the symmetric variant reads only the lower triangle, so callers may
//! pass a matrix whose strict upper part is garbage.

use crate::core::traits::LinearOperator;
use crate::error::EigsError;
use faer::MatRef;

/// y = A x for a general dense square matrix.
pub struct DenseGenMatProd<'a> {
    mat: MatRef<'a, f64>,
}

impl<'a> DenseGenMatProd<'a> {
    /// Wrap `mat`. The matrix must be square.
    pub fn new(mat: MatRef<'a, f64>) -> Result<Self, EigsError> {
        if mat.nrows() != mat.ncols() {
            return Err(EigsError::Configuration(
                "DenseGenMatProd: matrix must be square".to_string(),
            ));
        }
        Ok(Self { mat })
    }
}

impl LinearOperator for DenseGenMatProd<'_> {
    fn nrows(&self) -> usize {
        self.mat.nrows()
    }
    fn ncols(&self) -> usize {
        self.mat.ncols()
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<(), EigsError> {
        LinearOperator::apply(&self.mat, x, y)
    }
}

/// y = A x for a symmetric dense matrix, reading only the lower triangle.
pub struct DenseSymMatProd<'a> {
    mat: MatRef<'a, f64>,
}

impl<'a> DenseSymMatProd<'a> {
    /// Wrap `mat`. The matrix must be square; only entries with `i >= j` are used.
    pub fn new(mat: MatRef<'a, f64>) -> Result<Self, EigsError> {
        if mat.nrows() != mat.ncols() {
            return Err(EigsError::Configuration(
                "DenseSymMatProd: matrix must be square".to_string(),
            ));
        }
        Ok(Self { mat })
    }
}

impl LinearOperator for DenseSymMatProd<'_> {
    fn nrows(&self) -> usize {
        self.mat.nrows()
    }
    fn ncols(&self) -> usize {
        self.mat.ncols()
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<(), EigsError> {
        let n = self.mat.nrows();
        if x.len() != n || y.len() != n {
            return Err(EigsError::Operator(format!(
                "DenseSymMatProd: expected vectors of length {n}, got {} and {}",
                x.len(),
                y.len()
            )));
        }
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..=i {
                sum += self.mat[(i, j)] * x[j];
            }
            for j in (i + 1)..n {
                sum += self.mat[(j, i)] * x[j];
            }
            y[i] = sum;
        }
        Ok(())
    }
}
