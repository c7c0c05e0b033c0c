//! Dense shift-and-invert operators using Faer LU factorizations.
//!
//! Each adapter borrows the matrix `A`; `set_shift` factorizes `A − σI` with partial pivoting.
//! `apply` then performs a triangular solve against the cached factor.
//! A singular (or numerically singular) shifted matrix shows up as non-finite solve output and is
//! reported as `EigsError::Operator`; the solvers pass that error through unchanged.
//!
//! # Usage
//! - `DenseGenRealShiftSolve` for general matrices and a real shift.
//! - `DenseSymShiftSolve` for symmetric matrices (lower triangle is read).
//! - `DenseGenComplexShiftSolve` for general matrices and a complex shift; `apply` returns the
//!   real part of the complex solve.
//!
//! # References
//! - Faer documentation: https://github.com/sarah-ek/faer-rs
//! - Golub & Van Loan, Matrix Computations

use crate::core::traits::{ComplexShiftSolve, LinearOperator, RealShiftSolve};
use crate::error::EigsError;
use faer::linalg::solvers::{PartialPivLu, SolveCore};
use faer::{Conj, Mat, MatMut, MatRef, c64};
use num_complex::Complex64;

fn check_square(mat: MatRef<'_, f64>, name: &str) -> Result<(), EigsError> {
    if mat.nrows() != mat.ncols() {
        return Err(EigsError::Configuration(format!("{name}: matrix must be square")));
    }
    Ok(())
}

fn check_len(n: usize, x: usize, y: usize, name: &str) -> Result<(), EigsError> {
    if x != n || y != n {
        return Err(EigsError::Operator(format!(
            "{name}: expected vectors of length {n}, got {x} and {y}"
        )));
    }
    Ok(())
}

fn not_factorized(name: &str) -> EigsError {
    EigsError::Operator(format!("{name}: set_shift must be called before apply"))
}

fn singular(name: &str) -> EigsError {
    EigsError::Operator(format!("{name}: shifted matrix is singular to working precision"))
}

/// Solve in place against a real LU factor, rejecting non-finite output.
fn lu_solve_real(lu: &PartialPivLu<f64>, x: &[f64], y: &mut [f64], name: &str) -> Result<(), EigsError> {
    let n = y.len();
    y.copy_from_slice(x);
    let y_mat = MatMut::from_column_major_slice_mut(y, n, 1);
    lu.solve_in_place_with_conj(Conj::No, y_mat);
    if y.iter().any(|v| !v.is_finite()) {
        return Err(singular(name));
    }
    Ok(())
}

/// y = (A − σI)⁻¹ x for a general matrix and real σ.
pub struct DenseGenRealShiftSolve<'a> {
    mat: MatRef<'a, f64>,
    lu: Option<PartialPivLu<f64>>,
}

impl<'a> DenseGenRealShiftSolve<'a> {
    pub fn new(mat: MatRef<'a, f64>) -> Result<Self, EigsError> {
        check_square(mat, "DenseGenRealShiftSolve")?;
        Ok(Self { mat, lu: None })
    }
}

impl LinearOperator for DenseGenRealShiftSolve<'_> {
    fn nrows(&self) -> usize {
        self.mat.nrows()
    }
    fn ncols(&self) -> usize {
        self.mat.ncols()
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<(), EigsError> {
        const NAME: &str = "DenseGenRealShiftSolve";
        check_len(self.mat.nrows(), x.len(), y.len(), NAME)?;
        let lu = self.lu.as_ref().ok_or_else(|| not_factorized(NAME))?;
        lu_solve_real(lu, x, y, NAME)
    }
}

impl RealShiftSolve for DenseGenRealShiftSolve<'_> {
    fn set_shift(&mut self, sigma: f64) -> Result<(), EigsError> {
        let n = self.mat.nrows();
        let shifted = Mat::from_fn(n, n, |i, j| {
            if i == j { self.mat[(i, j)] - sigma } else { self.mat[(i, j)] }
        });
        self.lu = Some(PartialPivLu::new(shifted.as_ref()));
        Ok(())
    }
}

/// y = (A − σI)⁻¹ x for a symmetric matrix and real σ. Only the lower triangle of `A` is read.
pub struct DenseSymShiftSolve<'a> {
    mat: MatRef<'a, f64>,
    lu: Option<PartialPivLu<f64>>,
}

impl<'a> DenseSymShiftSolve<'a> {
    pub fn new(mat: MatRef<'a, f64>) -> Result<Self, EigsError> {
        check_square(mat, "DenseSymShiftSolve")?;
        Ok(Self { mat, lu: None })
    }
}

impl LinearOperator for DenseSymShiftSolve<'_> {
    fn nrows(&self) -> usize {
        self.mat.nrows()
    }
    fn ncols(&self) -> usize {
        self.mat.ncols()
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<(), EigsError> {
        const NAME: &str = "DenseSymShiftSolve";
        check_len(self.mat.nrows(), x.len(), y.len(), NAME)?;
        let lu = self.lu.as_ref().ok_or_else(|| not_factorized(NAME))?;
        lu_solve_real(lu, x, y, NAME)
    }
}

impl RealShiftSolve for DenseSymShiftSolve<'_> {
    fn set_shift(&mut self, sigma: f64) -> Result<(), EigsError> {
        let n = self.mat.nrows();
        // Mirror the lower triangle so the factorization sees the full symmetric matrix.
        let shifted = Mat::from_fn(n, n, |i, j| {
            let a = if i >= j { self.mat[(i, j)] } else { self.mat[(j, i)] };
            if i == j { a - sigma } else { a }
        });
        self.lu = Some(PartialPivLu::new(shifted.as_ref()));
        Ok(())
    }
}

/// Re[(A − σI)⁻¹ x] for a general matrix and complex σ.
pub struct DenseGenComplexShiftSolve<'a> {
    mat: MatRef<'a, f64>,
    lu: Option<PartialPivLu<c64>>,
}

impl<'a> DenseGenComplexShiftSolve<'a> {
    pub fn new(mat: MatRef<'a, f64>) -> Result<Self, EigsError> {
        check_square(mat, "DenseGenComplexShiftSolve")?;
        Ok(Self { mat, lu: None })
    }

    fn solve(&self, rhs: &mut [c64]) -> Result<(), EigsError> {
        const NAME: &str = "DenseGenComplexShiftSolve";
        let lu = self.lu.as_ref().ok_or_else(|| not_factorized(NAME))?;
        let n = rhs.len();
        let rhs_mat = MatMut::from_column_major_slice_mut(rhs, n, 1);
        lu.solve_in_place_with_conj(Conj::No, rhs_mat);
        if rhs.iter().any(|z| !(z.re.is_finite() && z.im.is_finite())) {
            return Err(singular(NAME));
        }
        Ok(())
    }
}

impl LinearOperator for DenseGenComplexShiftSolve<'_> {
    fn nrows(&self) -> usize {
        self.mat.nrows()
    }
    fn ncols(&self) -> usize {
        self.mat.ncols()
    }
    fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<(), EigsError> {
        check_len(self.mat.nrows(), x.len(), y.len(), "DenseGenComplexShiftSolve")?;
        let mut rhs: Vec<c64> = x.iter().map(|&xi| c64::new(xi, 0.0)).collect();
        self.solve(&mut rhs)?;
        for (yi, zi) in y.iter_mut().zip(&rhs) {
            *yi = zi.re;
        }
        Ok(())
    }
}

impl ComplexShiftSolve for DenseGenComplexShiftSolve<'_> {
    fn set_shift(&mut self, sigmar: f64, sigmai: f64) -> Result<(), EigsError> {
        let n = self.mat.nrows();
        let shifted = Mat::from_fn(n, n, |i, j| {
            if i == j {
                c64::new(self.mat[(i, j)] - sigmar, -sigmai)
            } else {
                c64::new(self.mat[(i, j)], 0.0)
            }
        });
        self.lu = Some(PartialPivLu::new(shifted.as_ref()));
        Ok(())
    }

    fn solve_complex(&self, x: &[Complex64], y: &mut [Complex64]) -> Result<(), EigsError> {
        check_len(self.mat.nrows(), x.len(), y.len(), "DenseGenComplexShiftSolve")?;
        let mut rhs: Vec<c64> = x.iter().map(|z| c64::new(z.re, z.im)).collect();
        self.solve(&mut rhs)?;
        for (yi, zi) in y.iter_mut().zip(&rhs) {
            *yi = Complex64::new(zi.re, zi.im);
        }
        Ok(())
    }
}
