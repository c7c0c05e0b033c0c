//! Wrappers for faer dense matrix types, closures and vector kernels.
//!
//! This module provides implementations of the core traits for `faer::Mat`, `faer::MatRef` and slices,
//! so that they can be handed to the eigensolvers directly. It also provides `FnOperator`, a
//! matrix-free adapter around a closure, which is the natural way to plug in sparse or implicit operators.
//!
//! # Features
//! - `LinearOperator` for `faer` dense matrices (dimension checks included).
//! - Inner product and norm for slices, with optional Rayon parallelism.
//! - Small axpy-style helpers used by the Krylov kernels.
//!
//! # References
//! - [faer crate documentation](https://docs.rs/faer)
//! - [num-traits crate documentation](https://docs.rs/num-traits)

use crate::core::traits::{InnerProduct, LinearOperator};
use crate::error::EigsError;
use faer::{Mat, MatRef};
use num_traits::Float;

fn check_dims(nrows: usize, ncols: usize, x: &[f64], y: &[f64]) -> Result<(), EigsError> {
    if x.len() != ncols || y.len() != nrows {
        return Err(EigsError::Operator(format!(
            "dimension mismatch: operator is {}x{}, got x of length {} and y of length {}",
            nrows,
            ncols,
            x.len(),
            y.len()
        )));
    }
    Ok(())
}

/// Implements the operator product for `faer::Mat`.
///
/// Computes `y = A * x` where `A` is a dense matrix.
impl LinearOperator for Mat<f64> {
    fn nrows(&self) -> usize {
        Mat::nrows(self)
    }
    fn ncols(&self) -> usize {
        Mat::ncols(self)
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<(), EigsError> {
        LinearOperator::apply(&self.as_ref(), x, y)
    }
}

/// Implements the operator product for a matrix reference (`faer::MatRef`).
impl<'a> LinearOperator for MatRef<'a, f64> {
    fn nrows(&self) -> usize {
        MatRef::nrows(self)
    }
    fn ncols(&self) -> usize {
        MatRef::ncols(self)
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<(), EigsError> {
        let (nrows, ncols) = (MatRef::nrows(self), MatRef::ncols(self));
        check_dims(nrows, ncols, x, y)?;
        for i in 0..nrows {
            let mut sum = 0.0;
            for j in 0..ncols {
                sum += self[(i, j)] * x[j];
            }
            y[i] = sum;
        }
        Ok(())
    }
}

/// Matrix-free operator defined by a closure `f(x, y)` writing `y = A x`.
///
/// The closure is the usual entry point for sparse matrices or operators that are never stored.
pub struct FnOperator<F> {
    n: usize,
    f: F,
}

impl<F> FnOperator<F>
where
    F: Fn(&[f64], &mut [f64]),
{
    /// Wrap `f` as a square operator of dimension `n`.
    pub fn new(n: usize, f: F) -> Self {
        Self { n, f }
    }
}

impl<F> LinearOperator for FnOperator<F>
where
    F: Fn(&[f64], &mut [f64]),
{
    fn nrows(&self) -> usize {
        self.n
    }
    fn ncols(&self) -> usize {
        self.n
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<(), EigsError> {
        check_dims(self.n, self.n, x, y)?;
        (self.f)(x, y);
        Ok(())
    }
}

#[cfg(feature = "rayon")]
const PAR_CHUNK: usize = 4096;

/// Implements inner product and norm for slices, with optional Rayon parallelism.
///
/// If the `rayon` feature is enabled, chunks of the vectors are reduced in parallel and the
/// partial sums are added in order.
impl<T: Float + From<f64> + Send + Sync> InnerProduct<[T]> for () {
    type Scalar = T;
    /// Computes the dot product of two vectors: `x^T y`.
    fn dot(&self, x: &[T], y: &[T]) -> T {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            // fixed chunks keep the summation order, and so the result, reproducible
            x.par_chunks(PAR_CHUNK)
                .zip(y.par_chunks(PAR_CHUNK))
                .map(|(xc, yc)| xc.iter().zip(yc).fold(T::zero(), |acc, (xi, yi)| acc + *xi * *yi))
                .collect::<Vec<T>>()
                .into_iter()
                .fold(T::zero(), |acc, v| acc + v)
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .zip(y.iter())
                .map(|(xi, yi)| *xi * *yi)
                .fold(T::zero(), |acc, v| acc + v)
        }
    }
    /// Computes the Euclidean norm of a vector: `||x||_2`.
    fn norm(&self, x: &[T]) -> T {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.par_chunks(PAR_CHUNK)
                .map(|xc| xc.iter().fold(T::zero(), |acc, xi| acc + *xi * *xi))
                .collect::<Vec<T>>()
                .into_iter()
                .fold(T::zero(), |acc, v| acc + v)
                .sqrt()
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .map(|xi| *xi * *xi)
                .fold(T::zero(), |acc, v| acc + v)
                .sqrt()
        }
    }
}

/// y ← y + alpha · x
pub(crate) fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * *xi;
    }
}

/// x ← alpha · x
pub(crate) fn scale(alpha: f64, x: &mut [f64]) {
    x.iter_mut().for_each(|xi| *xi *= alpha);
}
