//! Integration tests for the symmetric (Lanczos) eigensolvers.
//!
//! Covers known spectra (diagonal and the 1D Laplacian), agreement with faer's dense symmetric
//! eigensolver on random SPD matrices, the factorization invariants after a solve, and the
//! error paths: breakdown, exhausted budgets, bad configuration and early result queries.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use faer::{Mat, Side};
use kreigs::krylov::Lanczos;
use kreigs::{
    DenseSymMatProd, DenseSymShiftSolve, EigenSolver, EigsError, EigsStatus, FnOperator, SelectionRule,
    SymEigsShiftSolver, SymEigsSolver,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Diagonal operator with entries 1, 2, ..., n.
fn diagonal(n: usize) -> FnOperator<impl Fn(&[f64], &mut [f64])> {
    FnOperator::new(n, |x: &[f64], y: &mut [f64]| {
        for i in 0..x.len() {
            y[i] = (i + 1) as f64 * x[i];
        }
    })
}

/// The n×n tridiagonal matrix with 2 on the diagonal and -1 off it.
fn laplacian(n: usize) -> Mat<f64> {
    Mat::from_fn(n, n, |i, j| {
        if i == j {
            2.0
        } else if i.abs_diff(j) == 1 {
            -1.0
        } else {
            0.0
        }
    })
}

/// Random SPD matrix `A = Mᵀ M + I`.
fn random_spd(n: usize, seed: u64) -> Mat<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<f64> = (0..n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let m = |i: usize, j: usize| data[j * n + i];
    Mat::from_fn(n, n, |i, j| {
        let mtm: f64 = (0..n).map(|k| m(k, i) * m(k, j)).sum();
        if i == j { mtm + 1.0 } else { mtm }
    })
}

/// The three largest eigenvalues of diag(1..100) with m = 10, within 1e-10 and in < 50 restarts.
#[test]
fn diagonal_largest_three() {
    let op = diagonal(100);
    let mut solver = SymEigsSolver::new(&op, 3, 10).unwrap();
    solver.init().unwrap();
    let stats = solver.compute(1000, 1e-10, SelectionRule::LargestMagn).unwrap();
    assert!(stats.converged);
    assert_eq!(stats.nconv, 3);
    assert!(solver.num_iterations() < 50, "took {} restarts", solver.num_iterations());
    let values = solver.eigenvalues().unwrap();
    for (v, expected) in values.iter().zip([100.0, 99.0, 98.0]) {
        assert_relative_eq!(*v, expected, max_relative = 1e-10);
    }
    assert!(solver.ritz_converged().unwrap().iter().all(|&c| c));
}

/// Five smallest eigenvalues of the 50×50 Laplacian through shift-and-invert at σ = 0.
#[test]
fn laplacian_smallest_five_by_shift_invert() {
    let n = 50;
    let a = laplacian(n);
    let mut op = DenseSymShiftSolve::new(a.as_ref()).unwrap();
    let mut solver = SymEigsShiftSolver::new(&mut op, 5, 15, 0.0).unwrap();
    solver.init().unwrap();
    solver.compute(1000, 1e-10, SelectionRule::LargestMagn).unwrap();
    let values = solver.eigenvalues().unwrap();
    for (j, v) in values.iter().enumerate() {
        let k = (j + 1) as f64;
        let exact = 2.0 - 2.0 * (k * std::f64::consts::PI / (n as f64 + 1.0)).cos();
        assert_abs_diff_eq!(*v, exact, epsilon = 1e-8);
    }
}

/// Smallest algebraic eigenvalues without a shift agree with the shift-and-invert run.
#[test]
fn laplacian_smallest_algebraic_direct() {
    let n = 50;
    let a = laplacian(n);
    let op = DenseSymMatProd::new(a.as_ref()).unwrap();
    let mut solver = SymEigsSolver::new(&op, 2, 20).unwrap();
    solver.init().unwrap();
    solver.compute(5000, 1e-10, SelectionRule::SmallestAlge).unwrap();
    let values = solver.eigenvalues().unwrap();
    for (j, v) in values.iter().enumerate() {
        let k = (j + 1) as f64;
        let exact = 2.0 - 2.0 * (k * std::f64::consts::PI / (n as f64 + 1.0)).cos();
        assert_abs_diff_eq!(*v, exact, epsilon = 1e-8);
    }
}

/// Largest eigenvalues of a random SPD matrix match faer's dense solver.
#[test]
fn random_spd_matches_dense() {
    let n = 60;
    let a = random_spd(n, 42);
    let op = DenseSymMatProd::new(a.as_ref()).unwrap();
    let mut solver = SymEigsSolver::new(&op, 4, 20).unwrap();
    solver.init().unwrap();
    solver.compute(1000, 1e-10, SelectionRule::LargestAlge).unwrap();
    let values = solver.eigenvalues().unwrap();

    let evd = a.as_ref().self_adjoint_eigen(Side::Lower).unwrap();
    let s = evd.S();
    let mut dense: Vec<f64> = (0..n).map(|i| s[i]).collect();
    dense.sort_by(|x, y| y.total_cmp(x));
    for i in 0..4 {
        assert_relative_eq!(values[i], dense[i], max_relative = 1e-8);
    }

    // A v = λ v and ‖v‖ = 1
    let vectors = solver.eigenvectors().unwrap();
    for j in 0..4 {
        let mut norm = 0.0;
        for i in 0..n {
            let mut av = 0.0;
            for k in 0..n {
                av += a[(i, k)] * vectors[(k, j)];
            }
            assert_abs_diff_eq!(av, values[j] * vectors[(i, j)], epsilon = 1e-6 * values[j]);
            norm += vectors[(i, j)] * vectors[(i, j)];
        }
        assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-10);
    }
}

/// Orthogonality and the Lanczos relation hold for the final factorization.
#[test]
fn factorization_invariants_after_compute() {
    let n = 80;
    let a = random_spd(n, 7);
    let op = DenseSymMatProd::new(a.as_ref()).unwrap();
    let mut solver = SymEigsSolver::new(&op, 3, 12).unwrap();
    solver.init().unwrap();
    solver.compute(1000, 1e-10, SelectionRule::LargestMagn).unwrap();
    let fac: &kreigs::krylov::KrylovFactorization<Lanczos> = solver.factorization();
    let scale = solver.eigenvalues().unwrap()[0].abs();
    assert!(fac.orthogonality_error() < 1e-10);
    assert!(fac.arnoldi_residual(&op).unwrap() < 1e-10 * scale);
}

/// Reading results twice yields identical output.
#[test]
fn results_are_idempotent() {
    let op = diagonal(40);
    let mut solver = SymEigsSolver::new(&op, 4, 10).unwrap();
    solver.init().unwrap();
    solver.compute(1000, 1e-10, SelectionRule::LargestAlge).unwrap();
    let first = solver.eigenvalues().unwrap();
    let second = solver.eigenvalues().unwrap();
    assert_eq!(first, second);
    assert_eq!(solver.eigenvectors().unwrap(), solver.eigenvectors().unwrap());
}

/// A user start vector is honored and reproducible.
#[test]
fn explicit_start_vector_is_deterministic() {
    let op = diagonal(50);
    let v0: Vec<f64> = (0..50).map(|i| 1.0 + (i as f64).sin()).collect();
    let run = |v0: &[f64]| {
        let mut solver = SymEigsSolver::new(&op, 2, 8).unwrap();
        solver.init_with(v0).unwrap();
        solver.compute(1000, 1e-10, SelectionRule::LargestMagn).unwrap();
        (solver.eigenvalues().unwrap(), solver.num_operations())
    };
    assert_eq!(run(&v0), run(&v0));
}

/// With k = m - 1 the solver either converges or stops cleanly within the budget.
#[test]
fn minimal_restart_margin_terminates() {
    let op = diagonal(100);
    let mut solver = SymEigsSolver::new(&op, 3, 4).unwrap();
    solver.init().unwrap();
    match solver.compute(200, 1e-10, SelectionRule::LargestMagn) {
        Ok(stats) => {
            assert!(stats.converged);
            assert_eq!(solver.status(), EigsStatus::Converged);
        }
        Err(EigsError::NotConverged { iterations, nev, .. }) => {
            assert_eq!(iterations, 200);
            assert_eq!(nev, 3);
            assert_eq!(solver.status(), EigsStatus::NotConverging);
            assert_eq!(solver.eigenvalues().unwrap().len(), 3);
        }
        Err(e) => panic!("unexpected error: {e}"),
    }
    assert!(solver.num_iterations() <= 200);
}

/// An exhausted budget still exposes the best Ritz pairs, tagged as unconverged.
#[test]
fn exhausted_budget_keeps_results() {
    let op = diagonal(100);
    let mut solver = SymEigsSolver::new(&op, 3, 5).unwrap();
    solver.init().unwrap();
    let err = solver.compute(1, 1e-14, SelectionRule::LargestMagn).unwrap_err();
    assert!(matches!(err, EigsError::NotConverged { iterations: 1, nev: 3, .. }));
    assert_eq!(solver.status(), EigsStatus::NotConverging);
    assert_eq!(solver.num_iterations(), 1);
    let values = solver.eigenvalues().unwrap();
    assert_eq!(values.len(), 3);
    assert!(values[0] > 80.0);
    assert!(solver.ritz_converged().unwrap().iter().any(|&c| !c));
}

/// A start vector inside a 2-dimensional invariant subspace cannot deliver 3 eigenvalues.
#[test]
fn breakdown_below_nev_is_an_error() {
    let op = diagonal(10);
    let mut v0 = vec![0.0; 10];
    v0[0] = 1.0;
    v0[1] = 1.0;
    let mut solver = SymEigsSolver::new(&op, 3, 6).unwrap();
    solver.init_with(&v0).unwrap();
    let err = solver.compute(100, 1e-10, SelectionRule::LargestMagn).unwrap_err();
    assert!(matches!(err, EigsError::Breakdown { found: 2, required: 3 }));
    assert_eq!(solver.status(), EigsStatus::Failed);
    assert!(matches!(solver.eigenvalues(), Err(EigsError::NotReady)));
}

/// The same subspace is enough for 2 eigenvalues, which are then exact.
#[test]
fn breakdown_at_nev_is_exact() {
    let op = diagonal(10);
    let mut v0 = vec![0.0; 10];
    v0[0] = 1.0;
    v0[1] = 1.0;
    let mut solver = SymEigsSolver::new(&op, 2, 6).unwrap();
    solver.init_with(&v0).unwrap();
    solver.compute(100, 1e-10, SelectionRule::LargestMagn).unwrap();
    let values = solver.eigenvalues().unwrap();
    assert_abs_diff_eq!(values[0], 2.0, epsilon = 1e-13);
    assert_abs_diff_eq!(values[1], 1.0, epsilon = 1e-13);
    assert_eq!(solver.num_operations(), 2);
}

/// Invalid sizes are rejected before the operator is ever applied.
#[test]
fn configuration_errors_precede_operator_use() {
    let calls = std::cell::Cell::new(0usize);
    let op = FnOperator::new(10, |x: &[f64], y: &mut [f64]| {
        calls.set(calls.get() + 1);
        y.copy_from_slice(x);
    });
    for (nev, ncv) in [(0, 5), (10, 10), (3, 3), (3, 11)] {
        assert!(matches!(SymEigsSolver::new(&op, nev, ncv), Err(EigsError::Configuration(_))));
    }
    let mut solver = SymEigsSolver::new(&op, 2, 5).unwrap();
    assert!(matches!(solver.init_with(&[0.0; 10]), Err(EigsError::Configuration(_))));
    assert!(matches!(solver.init_with(&[1.0; 3]), Err(EigsError::Configuration(_))));
    assert_eq!(calls.get(), 0);
    assert!(matches!(solver.eigenvalues(), Err(EigsError::NotReady)));
}

/// Counters grow with the work done: one application per basis vector.
#[test]
fn operation_counter_tracks_applications() {
    let calls = std::cell::Cell::new(0usize);
    let op = FnOperator::new(60, |x: &[f64], y: &mut [f64]| {
        calls.set(calls.get() + 1);
        for i in 0..x.len() {
            y[i] = (i as f64 + 1.0).sqrt() * x[i];
        }
    });
    let mut solver = SymEigsSolver::new(&op, 2, 8).unwrap();
    solver.init().unwrap();
    assert_eq!(solver.num_operations(), 1);
    solver.compute(1000, 1e-10, SelectionRule::LargestAlge).unwrap();
    assert_eq!(solver.num_operations(), calls.get());
    // first extension adds 7, every restart adds 6
    assert_eq!(solver.num_operations(), 8 + 6 * solver.num_iterations());
}
