//! Implicitly restarted Lanczos for symmetric operators.
//!
//! `SymEigsSolver` finds `nev` eigenpairs of a symmetric operator selected by a
//! [`SelectionRule`], using a Lanczos factorization of size `ncv` that is compressed back to `nev`
//! vectors with exact shifts after every unsuccessful cycle. `SymEigsShiftSolver` runs the same
//! iteration on (A − σI)⁻¹ and reports λ = σ + 1/θ, which targets eigenvalues near σ.
//!
//! # Usage
//! 1. Wrap the matrix in an operator (`DenseSymMatProd`, `FnOperator`, ...).
//! 2. `new(&op, nev, ncv)`, then `init()` or `init_with(&v0)`.
//! 3. `compute(max_iter, tol, rule)`, then read `eigenvalues()` and `eigenvectors()`.
//!
//! # References
//! - Lehoucq, Sorensen & Yang, ARPACK Users' Guide, SIAM 1998
//! - Saad, Y. (2011). Numerical Methods for Large Eigenvalue Problems, 2nd Edition. SIAM.

use crate::core::traits::{LinearOperator, RealShiftSolve};
use crate::core::wrappers::axpy;
use crate::error::EigsError;
use crate::krylov::factorization::{Extension, KrylovFactorization, Lanczos};
use crate::krylov::ritz::{SymRitz, symmetric_ritz};
use crate::solver::{EigenSolver, EigsStatus, validate_dims};
use crate::utils::convergence::{Convergence, EigsStats};
use crate::utils::random::{DEFAULT_SEED, start_vector};
use crate::utils::selection::SelectionRule;
use faer::Mat;
use log::{debug, warn};

/// Final Ritz pairs kept after `compute`.
struct SymResults {
    values: Vec<f64>,
    vectors: Mat<f64>,
    converged: Vec<bool>,
}

/// Restarted Lanczos eigensolver for a symmetric operator.
pub struct SymEigsSolver<'a, Op: LinearOperator + ?Sized> {
    op: &'a Op,
    n: usize,
    nev: usize,
    ncv: usize,
    fac: KrylovFactorization<Lanczos>,
    results: Option<SymResults>,
    status: EigsStatus,
    num_iterations: usize,
    num_operations: usize,
}

impl<'a, Op: LinearOperator + ?Sized> SymEigsSolver<'a, Op> {
    /// Solver for `nev` eigenvalues using a subspace of size `ncv`.
    ///
    /// Requires a square n×n operator with 0 < nev < ncv ≤ n. `ncv ≥ 2·nev` is a good default.
    pub fn new(op: &'a Op, nev: usize, ncv: usize) -> Result<Self, EigsError> {
        validate_dims(op.nrows(), op.ncols(), nev, ncv)?;
        let n = op.nrows();
        Ok(Self {
            op,
            n,
            nev,
            ncv,
            fac: KrylovFactorization::new(n, ncv),
            results: None,
            status: EigsStatus::Uninitialized,
            num_iterations: 0,
            num_operations: 0,
        })
    }

    pub fn nev(&self) -> usize {
        self.nev
    }

    pub fn ncv(&self) -> usize {
        self.ncv
    }

    /// The current factorization, for inspecting its invariants.
    pub fn factorization(&self) -> &KrylovFactorization<Lanczos> {
        &self.fac
    }

    fn check_convergence(&self, ritz: &SymRitz, wanted: usize, conv: &Convergence) -> Vec<bool> {
        let p = ritz.values.len();
        let theta_abs: Vec<f64> = ritz.values[..wanted].iter().map(|t| t.abs()).collect();
        let last: Vec<f64> = (0..wanted).map(|i| ritz.vectors[(p - 1, i)].abs()).collect();
        conv.check(self.fac.residual_norm(), &theta_abs, &last)
    }

    /// Map the first `nev` Ritz pairs through the basis and store them.
    fn finalize(&mut self, ritz: &SymRitz, converged: Vec<bool>) {
        let basis = self.fac.basis();
        let mut vectors = Mat::zeros(self.n, self.nev);
        for c in 0..self.nev {
            let mut col = vec![0.0; self.n];
            for (i, v) in basis.iter().enumerate() {
                axpy(ritz.vectors[(i, c)], v, &mut col);
            }
            for (r, x) in col.into_iter().enumerate() {
                vectors[(r, c)] = x;
            }
        }
        self.results = Some(SymResults {
            values: ritz.values[..self.nev].to_vec(),
            vectors,
            converged,
        });
    }

    fn run(&mut self, conv: &Convergence, rule: SelectionRule) -> Result<EigsStats, EigsError> {
        let first = self.num_iterations;
        let mut ext = self.fac.extend(self.op, self.ncv, &mut self.num_operations)?;
        loop {
            let invariant = match ext {
                Extension::Invariant { dim } if dim < self.nev => {
                    warn!("Lanczos breakdown: invariant subspace of dimension {dim} < nev = {}", self.nev);
                    return Err(EigsError::Breakdown { found: dim, required: self.nev });
                }
                Extension::Invariant { .. } => true,
                Extension::Complete => false,
            };
            let ritz = symmetric_ritz(&self.fac.projected(), rule)?;
            let mut converged = self.check_convergence(&ritz, self.nev, conv);
            if invariant {
                // the basis spans an invariant subspace: the Ritz pairs are exact
                converged.iter_mut().for_each(|c| *c = true);
            }
            let nconv = converged.iter().filter(|&&c| c).count();
            debug!(
                "restart {}: {nconv}/{} converged, |f| = {:e}",
                self.num_iterations,
                self.nev,
                self.fac.residual_norm()
            );
            if nconv == self.nev {
                self.finalize(&ritz, converged);
                return Ok(self.stats(nconv, true));
            }
            if conv.exhausted(self.num_iterations - first) {
                warn!(
                    "Lanczos did not converge in {} restarts ({nconv}/{} pairs)",
                    self.num_iterations - first,
                    self.nev
                );
                self.finalize(&ritz, converged);
                return Err(EigsError::NotConverged {
                    iterations: self.num_iterations - first,
                    nconv,
                    nev: self.nev,
                });
            }
            self.num_iterations += 1;
            self.fac.restart(&ritz.shifts(self.nev), self.nev)?;
            ext = self.fac.extend(self.op, self.ncv, &mut self.num_operations)?;
        }
    }

    fn stats(&self, nconv: usize, converged: bool) -> EigsStats {
        EigsStats {
            iterations: self.num_iterations,
            operations: self.num_operations,
            nconv,
            converged,
        }
    }

    fn results(&self) -> Result<&SymResults, EigsError> {
        self.results.as_ref().ok_or(EigsError::NotReady)
    }
}

impl<Op: LinearOperator + ?Sized> EigenSolver for SymEigsSolver<'_, Op> {
    type Value = f64;
    type Vectors = Mat<f64>;

    fn init(&mut self) -> Result<(), EigsError> {
        self.init_with(&start_vector(self.n, DEFAULT_SEED))
    }

    fn init_with(&mut self, v0: &[f64]) -> Result<(), EigsError> {
        self.results = None;
        self.num_iterations = 0;
        self.num_operations = 0;
        self.fac.init(self.op, v0, &mut self.num_operations)?;
        self.status = EigsStatus::Initialized;
        Ok(())
    }

    fn compute(&mut self, max_iter: usize, tol: f64, rule: SelectionRule) -> Result<EigsStats, EigsError> {
        if !rule.valid_for_symmetric() {
            return Err(EigsError::Configuration(format!(
                "{rule:?} is not a valid selection rule for symmetric problems"
            )));
        }
        if self.status == EigsStatus::Uninitialized {
            return Err(EigsError::Configuration("init() must be called before compute()".to_string()));
        }
        if !tol.is_finite() || tol <= 0.0 {
            return Err(EigsError::Configuration(format!("tolerance must be positive, got {tol}")));
        }
        // a second compute continues from the current factorization
        self.status = EigsStatus::Computing;
        self.results = None;
        let conv = Convergence { tol, max_iters: max_iter };
        let outcome = self.run(&conv, rule);
        self.status = match &outcome {
            Ok(_) => EigsStatus::Converged,
            Err(EigsError::NotConverged { .. }) => EigsStatus::NotConverging,
            Err(_) => EigsStatus::Failed,
        };
        outcome
    }

    fn eigenvalues(&self) -> Result<Vec<f64>, EigsError> {
        Ok(self.results()?.values.clone())
    }

    fn eigenvectors(&self) -> Result<Mat<f64>, EigsError> {
        Ok(self.results()?.vectors.clone())
    }

    fn ritz_converged(&self) -> Result<Vec<bool>, EigsError> {
        Ok(self.results()?.converged.clone())
    }

    fn num_iterations(&self) -> usize {
        self.num_iterations
    }

    fn num_operations(&self) -> usize {
        self.num_operations
    }

    fn status(&self) -> EigsStatus {
        self.status
    }
}

/// λ = σ + 1/θ for a Ritz value θ of (A − σI)⁻¹.
fn shift_back(sigma: f64, theta: f64) -> Result<f64, EigsError> {
    if theta == 0.0 {
        return Err(EigsError::NumericalIssue(
            "zero Ritz value cannot be mapped back through the shift".to_string(),
        ));
    }
    Ok(sigma + 1.0 / theta)
}

/// Shift-and-invert Lanczos: eigenvalues of a symmetric A nearest σ.
///
/// The operator must compute y = (A − σI)⁻¹x once `set_shift(σ)` has been called; the
/// constructor does that. The selection rule applies to θ = 1/(λ − σ), so `LargestMagn`
/// gives the eigenvalues closest to σ. Results keep that order.
pub struct SymEigsShiftSolver<'a, Op: RealShiftSolve + ?Sized> {
    inner: SymEigsSolver<'a, Op>,
    sigma: f64,
}

impl<'a, Op: RealShiftSolve + ?Sized> SymEigsShiftSolver<'a, Op> {
    pub fn new(op: &'a mut Op, nev: usize, ncv: usize, sigma: f64) -> Result<Self, EigsError> {
        validate_dims(op.nrows(), op.ncols(), nev, ncv)?;
        op.set_shift(sigma)?;
        let op: &'a Op = op;
        Ok(Self { inner: SymEigsSolver::new(op, nev, ncv)?, sigma })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn factorization(&self) -> &KrylovFactorization<Lanczos> {
        self.inner.factorization()
    }
}

impl<Op: RealShiftSolve + ?Sized> EigenSolver for SymEigsShiftSolver<'_, Op> {
    type Value = f64;
    type Vectors = Mat<f64>;

    fn init(&mut self) -> Result<(), EigsError> {
        self.inner.init()
    }

    fn init_with(&mut self, v0: &[f64]) -> Result<(), EigsError> {
        self.inner.init_with(v0)
    }

    fn compute(&mut self, max_iter: usize, tol: f64, rule: SelectionRule) -> Result<EigsStats, EigsError> {
        self.inner.compute(max_iter, tol, rule)
    }

    fn eigenvalues(&self) -> Result<Vec<f64>, EigsError> {
        self.inner
            .eigenvalues()?
            .into_iter()
            .map(|theta| shift_back(self.sigma, theta))
            .collect()
    }

    fn eigenvectors(&self) -> Result<Mat<f64>, EigsError> {
        self.inner.eigenvectors()
    }

    fn ritz_converged(&self) -> Result<Vec<bool>, EigsError> {
        self.inner.ritz_converged()
    }

    fn num_iterations(&self) -> usize {
        self.inner.num_iterations()
    }

    fn num_operations(&self) -> usize {
        self.inner.num_operations()
    }

    fn status(&self) -> EigsStatus {
        self.inner.status()
    }
}
