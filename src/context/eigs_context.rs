//! Factory for the eigensolvers over a dense matrix.
//!
//! `EigsContext` holds a dense matrix, the problem kind and an [`EigsOptions`], builds the
//! matching operator adapter and solver, and runs init + compute in one call. It is the quickest
//! way to get eigenpairs of a `faer::Mat`; for matrix-free operators use the solvers directly.
//!
//! # Usage
//! 1. Construct an `EigsContext` with the kind, matrix and options.
//! 2. Call `solve_context` to get the eigenpairs.
//!
//! # Supported kinds
//! - Symmetric (Lanczos), with or without a real shift-and-invert
//! - General (Arnoldi), with or without a real or complex shift-and-invert

use crate::config::options::EigsOptions;
use crate::error::EigsError;
use crate::matrix::{
    DenseGenComplexShiftSolve, DenseGenMatProd, DenseGenRealShiftSolve, DenseSymMatProd, DenseSymShiftSolve,
};
use crate::solver::{
    EigenSolver, GenEigsComplexShiftSolver, GenEigsRealShiftSolver, GenEigsSolver, SymEigsShiftSolver,
    SymEigsSolver,
};
use crate::utils::convergence::EigsStats;
use faer::Mat;
use num_complex::Complex64;

/// Which problem to solve and in which spectral transformation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EigsKind {
    /// Symmetric A, iterate with A.
    Symmetric,
    /// Symmetric A, iterate with (A − σI)⁻¹.
    SymmetricShiftInvert { sigma: f64 },
    /// General A, iterate with A.
    General,
    /// General A, iterate with (A − σI)⁻¹ for real σ.
    GeneralRealShift { sigma: f64 },
    /// General A, iterate with Re[(A − σI)⁻¹] for complex σ.
    GeneralComplexShift { sigmar: f64, sigmai: f64 },
}

impl EigsKind {
    /// True for kinds that run the Lanczos solvers and return real eigenvalues.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, EigsKind::Symmetric | EigsKind::SymmetricShiftInvert { .. })
    }
}

/// Eigenpairs returned by [`EigsContext::solve_context`].
#[derive(Debug, Clone)]
pub struct EigenPairs {
    /// Eigenvalues in selection order; purely real for symmetric kinds.
    pub values: Vec<Complex64>,
    /// `vectors[i]` is the unit eigenvector for `values[i]`.
    pub vectors: Vec<Vec<Complex64>>,
    pub stats: EigsStats,
}

/// Context and configuration for an eigenvalue solve on a dense matrix.
pub struct EigsContext {
    pub kind: EigsKind,
    /// The matrix. Symmetric kinds read only its lower triangle.
    pub a: Mat<f64>,
    pub opts: EigsOptions,
}

/// init + compute + collect for any solver.
fn drive<S: EigenSolver>(
    solver: &mut S,
    opts: &EigsOptions,
) -> Result<(Vec<S::Value>, S::Vectors, EigsStats), EigsError> {
    match &opts.start {
        Some(v0) => solver.init_with(v0)?,
        None => solver.init()?,
    }
    let stats = solver.compute(opts.max_iter, opts.tol, opts.rule)?;
    Ok((solver.eigenvalues()?, solver.eigenvectors()?, stats))
}

fn real_pairs(values: Vec<f64>, vectors: Mat<f64>, stats: EigsStats) -> EigenPairs {
    let columns = (0..vectors.ncols())
        .map(|j| (0..vectors.nrows()).map(|i| Complex64::new(vectors[(i, j)], 0.0)).collect())
        .collect();
    EigenPairs {
        values: values.into_iter().map(|v| Complex64::new(v, 0.0)).collect(),
        vectors: columns,
        stats,
    }
}

impl EigsContext {
    pub fn new(kind: EigsKind, a: Mat<f64>, opts: EigsOptions) -> Self {
        Self { kind, a, opts }
    }

    /// Build the operator and solver for `kind`, then run it with `opts`.
    ///
    /// # Returns
    /// * `Ok(EigenPairs)` when all wanted pairs converged
    /// * `Err(EigsError)` on bad configuration, breakdown, operator failure or budget exhaustion
    pub fn solve_context(&self) -> Result<EigenPairs, EigsError> {
        let opts = self.opts.resolved_for(self.a.nrows())?;
        let (nev, ncv) = (opts.nev, opts.ncv);
        let a = self.a.as_ref();
        match self.kind {
            EigsKind::Symmetric => {
                let op = DenseSymMatProd::new(a)?;
                let mut solver = SymEigsSolver::new(&op, nev, ncv)?;
                let (values, vectors, stats) = drive(&mut solver, &opts)?;
                Ok(real_pairs(values, vectors, stats))
            }
            EigsKind::SymmetricShiftInvert { sigma } => {
                let mut op = DenseSymShiftSolve::new(a)?;
                let mut solver = SymEigsShiftSolver::new(&mut op, nev, ncv, sigma)?;
                let (values, vectors, stats) = drive(&mut solver, &opts)?;
                Ok(real_pairs(values, vectors, stats))
            }
            EigsKind::General => {
                let op = DenseGenMatProd::new(a)?;
                let mut solver = GenEigsSolver::new(&op, nev, ncv)?;
                let (values, vectors, stats) = drive(&mut solver, &opts)?;
                Ok(EigenPairs { values, vectors, stats })
            }
            EigsKind::GeneralRealShift { sigma } => {
                let mut op = DenseGenRealShiftSolve::new(a)?;
                let mut solver = GenEigsRealShiftSolver::new(&mut op, nev, ncv, sigma)?;
                let (values, vectors, stats) = drive(&mut solver, &opts)?;
                Ok(EigenPairs { values, vectors, stats })
            }
            EigsKind::GeneralComplexShift { sigmar, sigmai } => {
                let mut op = DenseGenComplexShiftSolve::new(a)?;
                let mut solver = GenEigsComplexShiftSolver::new(&mut op, nev, ncv, sigmar, sigmai)?;
                let (values, vectors, stats) = drive(&mut solver, &opts)?;
                Ok(EigenPairs { values, vectors, stats })
            }
        }
    }
}
