//! Eigensolver interfaces and implementations.
//!
//! Symmetric problems use the Lanczos recurrence and return real eigenpairs; general problems use
//! Arnoldi and return complex eigenpairs. Each has shift-and-invert variants that iterate with
//! (A − σI)⁻¹ and map the Ritz values back to eigenvalues of A.

use crate::error::EigsError;
use crate::utils::convergence::EigsStats;
use crate::utils::selection::SelectionRule;

/// Lifecycle of a solver instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EigsStatus {
    Uninitialized,
    Initialized,
    Computing,
    Converged,
    /// The restart budget ran out; the best Ritz pairs are still available.
    NotConverging,
    Failed,
}

/// Common interface for the restarted eigensolvers.
pub trait EigenSolver {
    /// Eigenvalue type: `f64` or `Complex64`.
    type Value;
    /// Eigenvector container returned by [`EigenSolver::eigenvectors`].
    type Vectors;

    /// Start from the default (seeded) start vector.
    fn init(&mut self) -> Result<(), EigsError>;

    /// Start from `v0`, which must be non-zero and of length n.
    fn init_with(&mut self, v0: &[f64]) -> Result<(), EigsError>;

    /// Run restart cycles until the wanted pairs converge or `max_iter` restarts are spent.
    ///
    /// Running out of budget returns [`EigsError::NotConverged`]; the best approximations remain
    /// available through `eigenvalues`/`eigenvectors`.
    fn compute(&mut self, max_iter: usize, tol: f64, rule: SelectionRule) -> Result<EigsStats, EigsError>;

    /// The wanted eigenvalues in selection order.
    fn eigenvalues(&self) -> Result<Vec<Self::Value>, EigsError>;

    /// The matching unit eigenvectors.
    fn eigenvectors(&self) -> Result<Self::Vectors, EigsError>;

    /// Per-pair convergence flags from the last extraction.
    fn ritz_converged(&self) -> Result<Vec<bool>, EigsError>;

    fn num_iterations(&self) -> usize;
    fn num_operations(&self) -> usize;
    fn status(&self) -> EigsStatus;
}

/// Check operator shape and subspace sizes: square n×n, 0 < nev < n, nev < ncv ≤ n.
pub(crate) fn validate_dims(nrows: usize, ncols: usize, nev: usize, ncv: usize) -> Result<(), EigsError> {
    if nrows != ncols {
        return Err(EigsError::Configuration(format!(
            "operator must be square, got {nrows}x{ncols}"
        )));
    }
    let n = nrows;
    if nev == 0 || nev >= n {
        return Err(EigsError::Configuration(format!(
            "nev must satisfy 0 < nev < n = {n}, got {nev}"
        )));
    }
    if ncv <= nev || ncv > n {
        return Err(EigsError::Configuration(format!(
            "ncv must satisfy nev < ncv <= n (nev = {nev}, n = {n}), got {ncv}"
        )));
    }
    Ok(())
}

pub mod sym_eigs;
pub use sym_eigs::{SymEigsShiftSolver, SymEigsSolver};

pub mod gen_eigs;
pub use gen_eigs::{GenEigsComplexShiftSolver, GenEigsRealShiftSolver, GenEigsSolver};
