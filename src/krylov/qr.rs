//! Shifted QR steps on upper Hessenberg matrices.
//!
//! Each step replaces `H` by `Qᵀ·H·Q` for an orthogonal `Q` built from the shift(s), and
//! right-multiplies an accumulator by the same `Q`. The restart controller chains these steps to
//! filter unwanted Ritz values out of the Krylov factorization.
//!
//! - [`single_shift_step`]: one real shift μ, using Givens rotations (QR of H − μI, then RQ + μI).
//! - [`double_shift_step`]: a complex conjugate pair μ, μ̄ in real arithmetic (Francis step),
//!   using 3×3 Householder reflectors to chase the bulge.
//!
//! # References
//! - Golub & Van Loan, Matrix Computations, §7.4-7.5
//! - Lehoucq & Sorensen, Deflation techniques for an implicitly restarted Arnoldi iteration

use faer::Mat;

/// Givens rotation (c, s) with [c s; -s c]·[a; b] = [r; 0].
fn givens(a: f64, b: f64) -> (f64, f64) {
    let r = a.hypot(b);
    if r == 0.0 { (1.0, 0.0) } else { (a / r, b / r) }
}

/// X[:, i..=i+1] ← X[:, i..=i+1]·Gᵀ for the first `rows` rows.
fn rotate_cols(x: &mut Mat<f64>, rows: usize, i: usize, c: f64, s: f64) {
    for r in 0..rows {
        let a = x[(r, i)];
        let b = x[(r, i + 1)];
        x[(r, i)] = c * a + s * b;
        x[(r, i + 1)] = -s * a + c * b;
    }
}

/// One implicitly shifted QR step with real shift `mu` on the leading p×p block of `h`.
pub fn single_shift_step(h: &mut Mat<f64>, q: &mut Mat<f64>, p: usize, mu: f64) {
    if p < 2 {
        return;
    }
    for i in 0..p {
        h[(i, i)] -= mu;
    }
    let mut rotations = Vec::with_capacity(p - 1);
    for i in 0..p - 1 {
        let (c, s) = givens(h[(i, i)], h[(i + 1, i)]);
        for col in i..p {
            let a = h[(i, col)];
            let b = h[(i + 1, col)];
            h[(i, col)] = c * a + s * b;
            h[(i + 1, col)] = -s * a + c * b;
        }
        h[(i + 1, i)] = 0.0;
        rotations.push((c, s));
    }
    let qrows = q.nrows();
    for (i, &(c, s)) in rotations.iter().enumerate() {
        // R is upper triangular, so only rows up to i+1 are touched
        rotate_cols(h, (i + 2).min(p), i, c, s);
        rotate_cols(q, qrows, i, c, s);
    }
    for i in 0..p {
        h[(i, i)] += mu;
    }
}

/// Householder vector u (‖u‖ = 1) with (I − 2uuᵀ)·x = ±‖x‖·e_1, or `None` when x = 0.
fn householder(x: &[f64]) -> Option<Vec<f64>> {
    let xnorm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
    if xnorm == 0.0 {
        return None;
    }
    let alpha = if x[0] >= 0.0 { -xnorm } else { xnorm };
    let mut u = x.to_vec();
    u[0] -= alpha;
    let unorm = u.iter().map(|v| v * v).sum::<f64>().sqrt();
    if unorm == 0.0 {
        return None;
    }
    u.iter_mut().for_each(|v| *v /= unorm);
    Some(u)
}

/// Apply P = I − 2uuᵀ acting on indices k..k+len(u): from the left to rows of `h` (all `p`
/// columns) and from the right to columns of `h` (all `p` rows) and of `q`.
fn reflect(h: &mut Mat<f64>, q: &mut Mat<f64>, p: usize, k: usize, u: &[f64]) {
    let r = u.len();
    for col in 0..p {
        let d: f64 = (0..r).map(|l| u[l] * h[(k + l, col)]).sum();
        for l in 0..r {
            h[(k + l, col)] -= 2.0 * u[l] * d;
        }
    }
    for row in 0..p {
        let d: f64 = (0..r).map(|l| u[l] * h[(row, k + l)]).sum();
        for l in 0..r {
            h[(row, k + l)] -= 2.0 * u[l] * d;
        }
    }
    for row in 0..q.nrows() {
        let d: f64 = (0..r).map(|l| u[l] * q[(row, k + l)]).sum();
        for l in 0..r {
            q[(row, k + l)] -= 2.0 * u[l] * d;
        }
    }
}

/// One Francis double-shift step on the leading p×p block of `h` for the shift pair with
/// `s = μ + μ̄` and `t = μ·μ̄`.
///
/// Equivalent to two single steps with μ and μ̄, but stays in real arithmetic.
pub fn double_shift_step(h: &mut Mat<f64>, q: &mut Mat<f64>, p: usize, s: f64, t: f64) {
    if p < 3 {
        return;
    }
    // first column of H² − sH + tI
    let mut x = h[(0, 0)] * h[(0, 0)] + h[(0, 1)] * h[(1, 0)] - s * h[(0, 0)] + t;
    let mut y = h[(1, 0)] * (h[(0, 0)] + h[(1, 1)] - s);
    let mut z = h[(2, 1)] * h[(1, 0)];
    for k in 0..p - 1 {
        let three = k + 2 < p;
        if k > 0 {
            x = h[(k, k - 1)];
            y = h[(k + 1, k - 1)];
            z = if three { h[(k + 2, k - 1)] } else { 0.0 };
        }
        let col: Vec<f64> = if three { vec![x, y, z] } else { vec![x, y] };
        if let Some(u) = householder(&col) {
            reflect(h, q, p, k, &u);
        }
        if k > 0 {
            h[(k + 1, k - 1)] = 0.0;
            if three {
                h[(k + 2, k - 1)] = 0.0;
            }
        }
    }
    for j in 0..p {
        for i in (j + 2)..p {
            h[(i, j)] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn hessenberg(p: usize) -> Mat<f64> {
        Mat::from_fn(p, p, |i, j| {
            if i > j + 1 { 0.0 } else { ((i * 5 + j * 3) % 7) as f64 + 1.0 }
        })
    }

    /// ‖QᵀH₀Q − H‖ entrywise max.
    fn similarity_defect(h0: &Mat<f64>, h: &Mat<f64>, q: &Mat<f64>) -> f64 {
        let p = h0.nrows();
        let mut worst: f64 = 0.0;
        for i in 0..p {
            for j in 0..p {
                let mut acc = 0.0;
                for a in 0..p {
                    for b in 0..p {
                        acc += q[(a, i)] * h0[(a, b)] * q[(b, j)];
                    }
                }
                worst = worst.max((acc - h[(i, j)]).abs());
            }
        }
        worst
    }

    fn trace(h: &Mat<f64>) -> f64 {
        (0..h.nrows()).map(|i| h[(i, i)]).sum()
    }

    #[test]
    fn single_shift_is_orthogonal_similarity() {
        let p = 6;
        let h0 = hessenberg(p);
        let mut h = h0.clone();
        let mut q = Mat::<f64>::identity(p, p);
        single_shift_step(&mut h, &mut q, p, 1.5);
        assert!(similarity_defect(&h0, &h, &q) < 1e-11);
        assert_abs_diff_eq!(trace(&h), trace(&h0), epsilon = 1e-11);
        for j in 0..p {
            for i in (j + 2)..p {
                assert_abs_diff_eq!(h[(i, j)], 0.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn exact_shift_deflates_last_row() {
        // [[2, 1], [1, 2]] has eigenvalues 1 and 3
        let h0 = Mat::from_fn(2, 2, |i, j| if i == j { 2.0 } else { 1.0 });
        let mut h = h0.clone();
        let mut q = Mat::<f64>::identity(2, 2);
        single_shift_step(&mut h, &mut q, 2, 1.0);
        assert_abs_diff_eq!(h[(1, 0)], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(h[(1, 1)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn double_shift_is_orthogonal_similarity() {
        let p = 7;
        let h0 = hessenberg(p);
        let mut h = h0.clone();
        let mut q = Mat::<f64>::identity(p, p);
        // shifts 0.5 ± 2i
        double_shift_step(&mut h, &mut q, p, 1.0, 0.25 + 4.0);
        assert!(similarity_defect(&h0, &h, &q) < 1e-10);
        for j in 0..p {
            for i in (j + 2)..p {
                assert_eq!(h[(i, j)], 0.0);
            }
        }
    }

    #[test]
    fn double_shift_on_three_by_three() {
        let h0 = Mat::from_fn(3, 3, |i, j| match (i, j) {
            (0, 0) => 5.0,
            (0, 1) => 1.0,
            (0, 2) => 0.5,
            (1, 0) => 0.3,
            (1, 1) => 1.0,
            (1, 2) => -2.0,
            (2, 1) => 2.0,
            (2, 2) => 1.0,
            _ => 0.0,
        });
        let mut h = h0.clone();
        let mut q = Mat::<f64>::identity(3, 3);
        double_shift_step(&mut h, &mut q, 3, 2.0, 5.0);
        assert!(similarity_defect(&h0, &h, &q) < 1e-11);
        assert_abs_diff_eq!(trace(&h), trace(&h0), epsilon = 1e-11);
        assert_eq!(h[(2, 0)], 0.0);
    }
}
