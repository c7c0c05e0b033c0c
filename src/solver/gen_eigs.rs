//! Implicitly restarted Arnoldi for general (nonsymmetric) operators.
//!
//! `GenEigsSolver` finds `nev` eigenpairs of a real square operator. Eigenvalues may be complex
//! and are returned as `Complex64`; conjugate pairs are kept together through selection and
//! restart, so the iteration itself stays in real arithmetic.
//!
//! Shift-and-invert variants:
//! - `GenEigsRealShiftSolver` iterates on (A − σI)⁻¹ and reports λ = σ + 1/θ.
//! - `GenEigsComplexShiftSolver` iterates on Re[(A − σI)⁻¹] for complex σ. Each Ritz value ν
//!   corresponds to two candidate eigenvalues; the one whose Ritz vector best satisfies
//!   (A − σI)⁻¹v = v/(λ − σ) is reported.
//!
//! # References
//! - Lehoucq, Sorensen & Yang, ARPACK Users' Guide, SIAM 1998
//! - Parlett & Saad, Complex shift and invert strategies for real matrices, LAA 88/89 (1987)

use crate::core::traits::{ComplexShiftSolve, LinearOperator, RealShiftSolve};
use crate::error::EigsError;
use crate::krylov::factorization::{Arnoldi, Extension, KrylovFactorization};
use crate::krylov::ritz::{GenRitz, general_ritz};
use crate::solver::{EigenSolver, EigsStatus, validate_dims};
use crate::utils::convergence::{Convergence, EigsStats};
use crate::utils::random::{DEFAULT_SEED, start_vector};
use crate::utils::selection::SelectionRule;
use log::{debug, warn};
use num_complex::Complex64;

struct GenResults {
    values: Vec<Complex64>,
    vectors: Vec<Vec<Complex64>>,
    converged: Vec<bool>,
}

/// Restarted Arnoldi eigensolver for a general real operator.
pub struct GenEigsSolver<'a, Op: LinearOperator + ?Sized> {
    op: &'a Op,
    n: usize,
    nev: usize,
    ncv: usize,
    fac: KrylovFactorization<Arnoldi>,
    results: Option<GenResults>,
    status: EigsStatus,
    num_iterations: usize,
    num_operations: usize,
}

impl<'a, Op: LinearOperator + ?Sized> GenEigsSolver<'a, Op> {
    /// Solver for `nev` eigenvalues using a subspace of size `ncv`.
    ///
    /// Requires a square n×n operator with 0 < nev < ncv ≤ n. Since a conjugate pair may push
    /// the retained size to nev + 1, `ncv ≥ 2·nev + 1` is recommended.
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

    pub fn factorization(&self) -> &KrylovFactorization<Arnoldi> {
        &self.fac
    }

    fn check_convergence(&self, ritz: &GenRitz, conv: &Convergence) -> Vec<bool> {
        let theta_abs: Vec<f64> = ritz.values[..self.nev].iter().map(|t| t.norm()).collect();
        let last: Vec<f64> = ritz.vectors[..self.nev]
            .iter()
            .map(|y| y.last().map_or(0.0, |z| z.norm()))
            .collect();
        conv.check(self.fac.residual_norm(), &theta_abs, &last)
    }

    fn finalize(&mut self, ritz: &GenRitz, converged: Vec<bool>) {
        let basis = self.fac.basis();
        let vectors = ritz.vectors[..self.nev]
            .iter()
            .map(|y| {
                let mut col = vec![Complex64::new(0.0, 0.0); self.n];
                for (v, &yi) in basis.iter().zip(y) {
                    for (c, &vr) in col.iter_mut().zip(v) {
                        *c += yi * vr;
                    }
                }
                col
            })
            .collect();
        self.results = Some(GenResults {
            values: ritz.values[..self.nev].to_vec(),
            vectors,
            converged,
        });
    }

    fn not_converged(&mut self, ritz: &GenRitz, converged: Vec<bool>, cycles: usize) -> EigsError {
        let nconv = converged.iter().filter(|&&c| c).count();
        self.finalize(ritz, converged);
        EigsError::NotConverged { iterations: cycles, nconv, nev: self.nev }
    }

    fn run(&mut self, conv: &Convergence, rule: SelectionRule) -> Result<EigsStats, EigsError> {
        let first = self.num_iterations;
        let mut ext = self.fac.extend(self.op, self.ncv, &mut self.num_operations)?;
        loop {
            let invariant = match ext {
                Extension::Invariant { dim } if dim < self.nev => {
                    warn!("Arnoldi breakdown: invariant subspace of dimension {dim} < nev = {}", self.nev);
                    return Err(EigsError::Breakdown { found: dim, required: self.nev });
                }
                Extension::Invariant { .. } => true,
                Extension::Complete => false,
            };
            let ritz = general_ritz(&self.fac.projected(), rule)?;
            let mut converged = self.check_convergence(&ritz, conv);
            if invariant {
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
                return Ok(EigsStats {
                    iterations: self.num_iterations,
                    operations: self.num_operations,
                    nconv,
                    converged: true,
                });
            }
            let cycles = self.num_iterations - first;
            if conv.exhausted(cycles) {
                warn!("Arnoldi did not converge in {cycles} restarts ({nconv}/{} pairs)", self.nev);
                return Err(self.not_converged(&ritz, converged, cycles));
            }
            let keep = ritz.retained(self.nev);
            if keep == 0 || keep >= self.fac.len() {
                // a conjugate pair straddles the only available cut
                warn!("cannot restart: retaining {keep} of {} Ritz values", self.fac.len());
                return Err(EigsError::Breakdown { found: keep, required: self.nev });
            }
            self.num_iterations += 1;
            self.fac.restart(&ritz.shifts(keep), keep)?;
            ext = self.fac.extend(self.op, self.ncv, &mut self.num_operations)?;
        }
    }

    fn results(&self) -> Result<&GenResults, EigsError> {
        self.results.as_ref().ok_or(EigsError::NotReady)
    }
}

impl<Op: LinearOperator + ?Sized> EigenSolver for GenEigsSolver<'_, Op> {
    type Value = Complex64;
    type Vectors = Vec<Vec<Complex64>>;

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
        if !rule.valid_for_general() {
            return Err(EigsError::Configuration(format!(
                "{rule:?} is not a valid selection rule for general problems"
            )));
        }
        if self.status == EigsStatus::Uninitialized {
            return Err(EigsError::Configuration("init() must be called before compute()".to_string()));
        }
        if !tol.is_finite() || tol <= 0.0 {
            return Err(EigsError::Configuration(format!("tolerance must be positive, got {tol}")));
        }
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

    fn eigenvalues(&self) -> Result<Vec<Complex64>, EigsError> {
        Ok(self.results()?.values.clone())
    }

    fn eigenvectors(&self) -> Result<Vec<Vec<Complex64>>, EigsError> {
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
fn shift_back(sigma: f64, theta: Complex64) -> Result<Complex64, EigsError> {
    if theta.norm() == 0.0 {
        return Err(EigsError::NumericalIssue(
            "zero Ritz value cannot be mapped back through the shift".to_string(),
        ));
    }
    Ok(sigma + theta.inv())
}

/// Shift-and-invert Arnoldi with a real shift: eigenvalues of A nearest σ.
pub struct GenEigsRealShiftSolver<'a, Op: RealShiftSolve + ?Sized> {
    inner: GenEigsSolver<'a, Op>,
    sigma: f64,
}

impl<'a, Op: RealShiftSolve + ?Sized> GenEigsRealShiftSolver<'a, Op> {
    pub fn new(op: &'a mut Op, nev: usize, ncv: usize, sigma: f64) -> Result<Self, EigsError> {
        validate_dims(op.nrows(), op.ncols(), nev, ncv)?;
        op.set_shift(sigma)?;
        let op: &'a Op = op;
        Ok(Self { inner: GenEigsSolver::new(op, nev, ncv)?, sigma })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl<Op: RealShiftSolve + ?Sized> EigenSolver for GenEigsRealShiftSolver<'_, Op> {
    type Value = Complex64;
    type Vectors = Vec<Vec<Complex64>>;

    fn init(&mut self) -> Result<(), EigsError> {
        self.inner.init()
    }

    fn init_with(&mut self, v0: &[f64]) -> Result<(), EigsError> {
        self.inner.init_with(v0)
    }

    fn compute(&mut self, max_iter: usize, tol: f64, rule: SelectionRule) -> Result<EigsStats, EigsError> {
        self.inner.compute(max_iter, tol, rule)
    }

    fn eigenvalues(&self) -> Result<Vec<Complex64>, EigsError> {
        self.inner
            .eigenvalues()?
            .into_iter()
            .map(|theta| shift_back(self.sigma, theta))
            .collect()
    }

    fn eigenvectors(&self) -> Result<Vec<Vec<Complex64>>, EigsError> {
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

/// Shift-and-invert Arnoldi with a complex shift σ = σr + iσi.
///
/// The iteration runs on the real operator Re[(A − σI)⁻¹], whose eigenvalues are
/// ν = ½(1/(λ − σ) + 1/(λ − σ̄)). Eigenvalues are recovered after each `compute`.
pub struct GenEigsComplexShiftSolver<'a, Op: ComplexShiftSolve + ?Sized> {
    inner: GenEigsSolver<'a, Op>,
    sigma: Complex64,
    values: Option<Vec<Complex64>>,
}

impl<'a, Op: ComplexShiftSolve + ?Sized> GenEigsComplexShiftSolver<'a, Op> {
    pub fn new(op: &'a mut Op, nev: usize, ncv: usize, sigmar: f64, sigmai: f64) -> Result<Self, EigsError> {
        validate_dims(op.nrows(), op.ncols(), nev, ncv)?;
        op.set_shift(sigmar, sigmai)?;
        let op: &'a Op = op;
        Ok(Self {
            inner: GenEigsSolver::new(op, nev, ncv)?,
            sigma: Complex64::new(sigmar, sigmai),
            values: None,
        })
    }

    pub fn sigma(&self) -> Complex64 {
        self.sigma
    }

    /// Pick, for each Ritz value ν, the root λ of ν = ½(1/(λ − σ) + 1/(λ − σ̄)) whose Ritz vector
    /// gives the smaller residual ‖(A − σI)⁻¹v − v/(λ − σ)‖.
    fn back_transform(&self) -> Result<Vec<Complex64>, EigsError> {
        let nus = self.inner.eigenvalues()?;
        let vecs = self.inner.eigenvectors()?;
        let (sr, si) = (self.sigma.re, self.sigma.im);
        let n = self.inner.n;
        let mut solved = vec![Complex64::new(0.0, 0.0); n];
        let mut out = Vec::with_capacity(nus.len());
        for (&nu, v) in nus.iter().zip(&vecs) {
            if nu.norm() == 0.0 {
                return Err(EigsError::NumericalIssue(
                    "zero Ritz value cannot be mapped back through a complex shift".to_string(),
                ));
            }
            let root = (Complex64::new(1.0, 0.0) - 4.0 * nu * nu * si * si).sqrt();
            let candidates = [
                sr + (1.0 + root) / (2.0 * nu),
                sr + (1.0 - root) / (2.0 * nu),
            ];
            self.inner.op.solve_complex(v, &mut solved)?;
            let residual = |lambda: Complex64| -> f64 {
                let inv = (lambda - self.sigma).inv();
                solved
                    .iter()
                    .zip(v)
                    .map(|(s, vi)| (s - vi * inv).norm_sqr())
                    .sum::<f64>()
            };
            let best = if residual(candidates[1]) < residual(candidates[0]) {
                candidates[1]
            } else {
                candidates[0]
            };
            out.push(best);
        }
        Ok(out)
    }
}

impl<Op: ComplexShiftSolve + ?Sized> EigenSolver for GenEigsComplexShiftSolver<'_, Op> {
    type Value = Complex64;
    type Vectors = Vec<Vec<Complex64>>;

    fn init(&mut self) -> Result<(), EigsError> {
        self.values = None;
        self.inner.init()
    }

    fn init_with(&mut self, v0: &[f64]) -> Result<(), EigsError> {
        self.values = None;
        self.inner.init_with(v0)
    }

    fn compute(&mut self, max_iter: usize, tol: f64, rule: SelectionRule) -> Result<EigsStats, EigsError> {
        self.values = None;
        let outcome = self.inner.compute(max_iter, tol, rule);
        if matches!(outcome, Ok(_) | Err(EigsError::NotConverged { .. })) {
            let values = self.back_transform();
            match values {
                Ok(values) => self.values = Some(values),
                Err(e) => {
                    self.inner.status = EigsStatus::Failed;
                    self.inner.results = None;
                    return Err(e);
                }
            }
        }
        outcome
    }

    fn eigenvalues(&self) -> Result<Vec<Complex64>, EigsError> {
        self.values.clone().ok_or(EigsError::NotReady)
    }

    fn eigenvectors(&self) -> Result<Vec<Vec<Complex64>>, EigsError> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{DenseGenComplexShiftSolve, DenseGenMatProd, DenseGenRealShiftSolve};
    use approx::assert_abs_diff_eq;
    use faer::Mat;

    /// Block diagonal: 2×2 rotation-scaling blocks with eigenvalues a ± bi, then a real tail.
    fn block_matrix(n: usize) -> Mat<f64> {
        Mat::from_fn(n, n, |i, j| {
            if i < 6 {
                let block = i / 2;
                let (a, b) = (10.0 - 2.0 * block as f64, 1.0 + block as f64);
                match (i % 2, j) {
                    (0, jj) if jj == i => a,
                    (0, jj) if jj == i + 1 => -b,
                    (1, jj) if jj + 1 == i => b,
                    (1, jj) if jj == i => a,
                    _ => 0.0,
                }
            } else if i == j {
                (i as f64) * 0.1
            } else {
                0.0
            }
        })
    }

    #[test]
    fn finds_conjugate_pair_with_largest_modulus() {
        let a = block_matrix(40);
        let op = DenseGenMatProd::new(a.as_ref()).unwrap();
        let mut solver = GenEigsSolver::new(&op, 2, 10).unwrap();
        solver.init().unwrap();
        solver.compute(1000, 1e-10, SelectionRule::LargestMagn).unwrap();
        let vals = solver.eigenvalues().unwrap();
        // 10 ± i has modulus √101, larger than 8 ± 2i
        assert_abs_diff_eq!(vals[0].re, 10.0, epsilon = 1e-8);
        assert_abs_diff_eq!(vals[0].im, 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(vals[1].im, -1.0, epsilon = 1e-8);
    }

    #[test]
    fn ritz_vectors_satisfy_eigen_equation() {
        let a = block_matrix(30);
        let op = DenseGenMatProd::new(a.as_ref()).unwrap();
        let mut solver = GenEigsSolver::new(&op, 3, 12).unwrap();
        solver.init().unwrap();
        solver.compute(1000, 1e-10, SelectionRule::LargestReal).unwrap();
        let vals = solver.eigenvalues().unwrap();
        let vecs = solver.eigenvectors().unwrap();
        for (lambda, v) in vals.iter().zip(&vecs) {
            for i in 0..30 {
                let mut av = Complex64::new(0.0, 0.0);
                for j in 0..30 {
                    av += a[(i, j)] * v[j];
                }
                assert!((av - lambda * v[i]).norm() < 1e-7);
            }
        }
    }

    #[test]
    fn rejects_symmetric_only_rules() {
        let a = block_matrix(20);
        let op = DenseGenMatProd::new(a.as_ref()).unwrap();
        let mut solver = GenEigsSolver::new(&op, 2, 6).unwrap();
        solver.init().unwrap();
        assert!(matches!(
            solver.compute(10, 1e-10, SelectionRule::LargestAlge),
            Err(EigsError::Configuration(_))
        ));
    }

    #[test]
    fn real_shift_targets_nearby_eigenvalues() {
        let a = block_matrix(30);
        let mut op = DenseGenRealShiftSolve::new(a.as_ref()).unwrap();
        let mut solver = GenEigsRealShiftSolver::new(&mut op, 1, 8, 1.23).unwrap();
        assert_eq!(solver.sigma(), 1.23);
        solver.init().unwrap();
        solver.compute(1000, 1e-10, SelectionRule::LargestMagn).unwrap();
        let vals = solver.eigenvalues().unwrap();
        // tail eigenvalues are 0.6, 0.7, ..., 2.9; nearest to 1.23 is 1.2
        assert_abs_diff_eq!(vals[0].re, 1.2, epsilon = 1e-8);
        assert_abs_diff_eq!(vals[0].im, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn complex_shift_recovers_pair_near_shift() {
        let a = block_matrix(30);
        let mut op = DenseGenComplexShiftSolve::new(a.as_ref()).unwrap();
        let mut solver = GenEigsComplexShiftSolver::new(&mut op, 2, 10, 8.1, 1.9).unwrap();
        solver.init().unwrap();
        solver.compute(1000, 1e-10, SelectionRule::LargestMagn).unwrap();
        let vals = solver.eigenvalues().unwrap();
        let near = vals.iter().any(|z| (z - Complex64::new(8.0, 2.0)).norm() < 1e-6);
        assert!(near, "expected 8 + 2i among {vals:?}");
        for z in &vals {
            assert_abs_diff_eq!(z.re, 8.0, epsilon = 1e-6);
            assert_abs_diff_eq!(z.im.abs(), 2.0, epsilon = 1e-6);
        }
    }

    /// Normal matrix made of 2×2 rotation-scaling blocks only, so every eigenvalue is complex.
    fn rotations(n: usize) -> Mat<f64> {
        Mat::from_fn(n, n, |i, j| {
            let k = (i / 2) as f64;
            let (a, b) = (1.0 + 0.1 * k, 5.0 - 0.2 * k);
            if i / 2 != j / 2 {
                0.0
            } else if i == j {
                a
            } else if i < j {
                -b
            } else {
                b
            }
        })
    }

    #[test]
    fn pair_across_the_only_cut_is_a_breakdown() {
        let a = rotations(20);
        let op = DenseGenMatProd::new(a.as_ref()).unwrap();
        let mut solver = GenEigsSolver::new(&op, 1, 2).unwrap();
        assert_eq!((solver.nev(), solver.ncv()), (1, 2));
        solver.init().unwrap();
        let err = solver.compute(300, 1e-10, SelectionRule::LargestMagn).unwrap_err();
        assert!(matches!(err, EigsError::Breakdown { found: 0, required: 1 }));
        assert_eq!(solver.status(), EigsStatus::Failed);
        assert!(solver.num_iterations() < 300);
        assert!(matches!(solver.eigenvalues(), Err(EigsError::NotReady)));
    }

    /// Scales by 1/(i+1) but has no complex solve.
    struct RealOnly {
        n: usize,
    }

    impl LinearOperator for RealOnly {
        fn nrows(&self) -> usize {
            self.n
        }
        fn ncols(&self) -> usize {
            self.n
        }
        fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<(), EigsError> {
            for i in 0..self.n {
                y[i] = x[i] / (i + 1) as f64;
            }
            Ok(())
        }
    }

    impl ComplexShiftSolve for RealOnly {
        fn set_shift(&mut self, _sigmar: f64, _sigmai: f64) -> Result<(), EigsError> {
            Ok(())
        }
        fn solve_complex(&self, _x: &[Complex64], _y: &mut [Complex64]) -> Result<(), EigsError> {
            Err(EigsError::Operator("complex solve unavailable".to_string()))
        }
    }

    #[test]
    fn failed_back_transform_clears_results() {
        let mut op = RealOnly { n: 30 };
        let mut solver = GenEigsComplexShiftSolver::new(&mut op, 2, 8, 0.0, 0.5).unwrap();
        assert_eq!(solver.sigma(), Complex64::new(0.0, 0.5));
        solver.init().unwrap();
        let err = solver.compute(1000, 1e-10, SelectionRule::LargestMagn).unwrap_err();
        assert!(matches!(err, EigsError::Operator(_)));
        assert_eq!(solver.status(), EigsStatus::Failed);
        assert!(matches!(solver.eigenvalues(), Err(EigsError::NotReady)));
        assert!(matches!(solver.eigenvectors(), Err(EigsError::NotReady)));
        assert!(matches!(solver.ritz_converged(), Err(EigsError::NotReady)));
    }

    #[test]
    fn real_shift_rejects_zero_ritz_value() {
        let zero = Complex64::new(0.0, 0.0);
        assert!(matches!(shift_back(2.0, zero), Err(EigsError::NumericalIssue(_))));
        let lambda = shift_back(2.0, Complex64::new(0.0, 1.0)).unwrap();
        assert_abs_diff_eq!(lambda.re, 2.0);
        assert_abs_diff_eq!(lambda.im, -1.0);
    }
}
