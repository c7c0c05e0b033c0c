//! Krylov factorization A·V = V·H + f·e_pᵀ and the basis builder that grows it.
//!
//! The factorization keeps an orthonormal basis `V` (n×p, stored column by column), the projected
//! matrix `H` (allocated m×m, only the leading p×p block is live) and the residual vector `f`.
//! Two recurrences share the same storage:
//!
//! - [`Arnoldi`]: classical Gram-Schmidt against all previous vectors, `H` upper Hessenberg.
//! - [`Lanczos`]: three-term recurrence, `H` symmetric tridiagonal.
//!
//! Both run one full reorthogonalization pass after the primary projection. When the residual collapses relative to the operator scale the builder stops and
//! reports an invariant subspace instead of dividing by a tiny norm.

use crate::core::traits::{InnerProduct, LinearOperator};
use crate::core::wrappers::{axpy, scale};
use crate::error::EigsError;
use faer::Mat;
use log::trace;
use std::marker::PhantomData;

pub(crate) fn dot(x: &[f64], y: &[f64]) -> f64 {
    InnerProduct::<[f64]>::dot(&(), x, y)
}

pub(crate) fn norm(x: &[f64]) -> f64 {
    InnerProduct::<[f64]>::norm(&(), x)
}

/// How a new operator image is orthogonalized and recorded in `H`.
pub trait Recurrence {
    /// `true` when `H` is kept symmetric tridiagonal.
    const SYMMETRIC: bool;

    /// Orthogonalize `w = A v_j` against `basis` (which already holds v_0..v_j) and fill column `j`
    /// of `h`. On return `w` holds the new residual.
    fn orthogonalize(basis: &[Vec<f64>], w: &mut [f64], h: &mut Mat<f64>, j: usize);

    /// Restore the structure of the leading p×p block of `h` after a restart.
    fn tidy(h: &mut Mat<f64>, p: usize);
}

/// Arnoldi recurrence for general operators.
#[derive(Debug, Clone, Copy)]
pub struct Arnoldi;

/// Lanczos recurrence for symmetric operators.
#[derive(Debug, Clone, Copy)]
pub struct Lanczos;

/// Project `w` onto `basis`, subtract the projection and return the coefficients.
fn project_out(basis: &[Vec<f64>], w: &mut [f64]) -> Vec<f64> {
    let coeffs: Vec<f64> = basis.iter().map(|v| dot(v, w)).collect();
    for (v, &c) in basis.iter().zip(&coeffs) {
        axpy(-c, v, w);
    }
    coeffs
}

impl Recurrence for Arnoldi {
    const SYMMETRIC: bool = false;

    fn orthogonalize(basis: &[Vec<f64>], w: &mut [f64], h: &mut Mat<f64>, j: usize) {
        let first = project_out(basis, w);
        // second pass
        let correction = project_out(basis, w);
        for (i, (a, b)) in first.iter().zip(&correction).enumerate() {
            h[(i, j)] = a + b;
        }
    }

    fn tidy(h: &mut Mat<f64>, p: usize) {
        for j in 0..p {
            for i in (j + 2)..p {
                h[(i, j)] = 0.0;
            }
        }
    }
}

impl Recurrence for Lanczos {
    const SYMMETRIC: bool = true;

    fn orthogonalize(basis: &[Vec<f64>], w: &mut [f64], h: &mut Mat<f64>, j: usize) {
        let mut alpha = dot(&basis[j], w);
        axpy(-alpha, &basis[j], w);
        if j > 0 {
            axpy(-h[(j, j - 1)], &basis[j - 1], w);
        }
        let correction = project_out(basis, w);
        alpha += correction[j];
        h[(j, j)] = alpha;
    }

    fn tidy(h: &mut Mat<f64>, p: usize) {
        for j in 0..p {
            for i in 0..p {
                if i.abs_diff(j) > 1 {
                    h[(i, j)] = 0.0;
                }
            }
        }
        for i in 1..p {
            let off = 0.5 * (h[(i, i - 1)] + h[(i - 1, i)]);
            h[(i, i - 1)] = off;
            h[(i - 1, i)] = off;
        }
    }
}

/// Result of growing the factorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    /// The requested size was reached.
    Complete,
    /// The residual vanished: the first `dim` basis vectors span an invariant subspace.
    Invariant { dim: usize },
}

/// A size-p Krylov factorization with capacity m.
pub struct KrylovFactorization<R: Recurrence> {
    n: usize,
    ncv: usize,
    basis: Vec<Vec<f64>>,
    h: Mat<f64>,
    f: Vec<f64>,
    /// ‖A v‖ of the most recent operator application; scale for the breakdown test.
    op_scale: f64,
    _recurrence: PhantomData<R>,
}

impl<R: Recurrence> KrylovFactorization<R> {
    /// Empty factorization for an n×n operator and at most `ncv` basis vectors.
    pub fn new(n: usize, ncv: usize) -> Self {
        Self {
            n,
            ncv,
            basis: Vec::with_capacity(ncv),
            h: Mat::zeros(ncv, ncv),
            f: vec![0.0; n],
            op_scale: 0.0,
            _recurrence: PhantomData,
        }
    }

    /// Current size p.
    pub fn len(&self) -> usize {
        self.basis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basis.is_empty()
    }

    /// Capacity m.
    pub fn capacity(&self) -> usize {
        self.ncv
    }

    /// The orthonormal basis vectors v_0..v_{p-1}.
    pub fn basis(&self) -> &[Vec<f64>] {
        &self.basis
    }

    /// Copy of the live p×p block of `H`.
    pub fn projected(&self) -> Mat<f64> {
        let p = self.len();
        Mat::from_fn(p, p, |i, j| self.h[(i, j)])
    }

    pub fn residual(&self) -> &[f64] {
        &self.f
    }

    pub fn residual_norm(&self) -> f64 {
        norm(&self.f)
    }

    fn breakdown_threshold(&self) -> f64 {
        self.n as f64 * f64::EPSILON * self.op_scale
    }

    fn apply_op<Op>(&mut self, op: &Op, j: usize, ops: &mut usize) -> Result<Vec<f64>, EigsError>
    where
        Op: LinearOperator + ?Sized,
    {
        let mut w = vec![0.0; self.n];
        op.apply(&self.basis[j], &mut w)?;
        *ops += 1;
        if w.iter().any(|v| !v.is_finite()) {
            return Err(EigsError::NumericalIssue(format!(
                "operator produced a non-finite image of basis vector {j}"
            )));
        }
        self.op_scale = norm(&w);
        Ok(w)
    }

    /// Start a size-1 factorization from `v0`, which must be non-zero.
    ///
    /// Applies the operator once. Any previous state is discarded.
    pub fn init<Op>(&mut self, op: &Op, v0: &[f64], ops: &mut usize) -> Result<(), EigsError>
    where
        Op: LinearOperator + ?Sized,
    {
        if v0.len() != self.n {
            return Err(EigsError::Configuration(format!(
                "start vector has length {}, expected {}",
                v0.len(),
                self.n
            )));
        }
        let v0_norm = norm(v0);
        if v0_norm == 0.0 || !v0_norm.is_finite() {
            return Err(EigsError::Configuration(
                "start vector must be non-zero and finite".to_string(),
            ));
        }
        let mut v = v0.to_vec();
        scale(1.0 / v0_norm, &mut v);

        self.basis.clear();
        self.h = Mat::zeros(self.ncv, self.ncv);
        self.basis.push(v);
        let mut w = self.apply_op(op, 0, ops)?;
        R::orthogonalize(&self.basis, &mut w, &mut self.h, 0);
        self.f = w;
        trace!("factorization initialized, |f| = {:e}", self.residual_norm());
        Ok(())
    }

    /// Grow the factorization from its current size to `to` (≤ m).
    ///
    /// Each step applies the operator once. Stops early with [`Extension::Invariant`] when the
    /// residual norm drops below n·ε·‖A v‖.
    pub fn extend<Op>(&mut self, op: &Op, to: usize, ops: &mut usize) -> Result<Extension, EigsError>
    where
        Op: LinearOperator + ?Sized,
    {
        if self.is_empty() {
            return Err(EigsError::NotReady);
        }
        let to = to.min(self.ncv);
        for j in self.len()..to {
            let beta = self.residual_norm();
            if !beta.is_finite() {
                return Err(EigsError::NumericalIssue(format!(
                    "residual norm is not finite at step {j}"
                )));
            }
            if beta <= self.breakdown_threshold() {
                trace!("invariant subspace of dimension {j} (|f| = {beta:e})");
                return Ok(Extension::Invariant { dim: j });
            }
            for i in 0..self.ncv {
                self.h[(i, j)] = 0.0;
                self.h[(j, i)] = 0.0;
            }
            self.h[(j, j - 1)] = beta;
            if R::SYMMETRIC {
                self.h[(j - 1, j)] = beta;
            }
            let mut v = std::mem::take(&mut self.f);
            scale(1.0 / beta, &mut v);
            self.basis.push(v);

            let mut w = self.apply_op(op, j, ops)?;
            R::orthogonalize(&self.basis, &mut w, &mut self.h, j);
            self.f = w;
            trace!("extended to {} vectors, |f| = {:e}", j + 1, self.residual_norm());
        }
        if self.residual_norm() <= self.breakdown_threshold() {
            return Ok(Extension::Invariant { dim: self.len() });
        }
        Ok(Extension::Complete)
    }

    /// Replace the factorization by its image under the orthogonal m×m matrix `q`, keeping the
    /// first `keep` columns.
    ///
    /// `h_new` must equal qᵀ·H·q. The new residual is v'_keep·h_new[keep, keep-1] + f·q[p-1, keep-1],
    /// which leaves A·V' = V'·H' + f'·e_keepᵀ intact.
    pub(crate) fn compress(&mut self, q: &Mat<f64>, h_new: &Mat<f64>, keep: usize) {
        let p = self.len();
        let mut new_basis: Vec<Vec<f64>> = Vec::with_capacity(self.ncv);
        for j in 0..=keep {
            let mut col = vec![0.0; self.n];
            for (i, v) in self.basis.iter().enumerate() {
                axpy(q[(i, j)], v, &mut col);
            }
            new_basis.push(col);
        }
        let mut f_new = vec![0.0; self.n];
        axpy(h_new[(keep, keep - 1)], &new_basis[keep], &mut f_new);
        axpy(q[(p - 1, keep - 1)], &self.f, &mut f_new);
        new_basis.truncate(keep);

        let mut h = Mat::zeros(self.ncv, self.ncv);
        for j in 0..keep {
            for i in 0..keep {
                h[(i, j)] = h_new[(i, j)];
            }
        }
        self.basis = new_basis;
        self.h = h;
        self.f = f_new;
    }

    /// max_j ‖A v_j − V h_j − f δ_{j,p-1}‖, the column-wise defect of the factorization identity.
    ///
    /// Applies the operator p times; these applications are not counted.
    pub fn arnoldi_residual<Op>(&self, op: &Op) -> Result<f64, EigsError>
    where
        Op: LinearOperator + ?Sized,
    {
        let p = self.len();
        let mut worst: f64 = 0.0;
        let mut w = vec![0.0; self.n];
        for j in 0..p {
            op.apply(&self.basis[j], &mut w)?;
            for (i, v) in self.basis.iter().enumerate() {
                axpy(-self.h[(i, j)], v, &mut w);
            }
            if j + 1 == p {
                axpy(-1.0, &self.f, &mut w);
            }
            worst = worst.max(norm(&w));
        }
        Ok(worst)
    }

    /// max |VᵀV − I| entrywise, plus |Vᵀf| since f must be orthogonal to the basis.
    pub fn orthogonality_error(&self) -> f64 {
        let mut worst: f64 = 0.0;
        for (i, vi) in self.basis.iter().enumerate() {
            for (j, vj) in self.basis.iter().enumerate().skip(i) {
                let target = if i == j { 1.0 } else { 0.0 };
                worst = worst.max((dot(vi, vj) - target).abs());
            }
        }
        let f_norm = self.residual_norm();
        if f_norm > 0.0 {
            for v in &self.basis {
                worst = worst.max((dot(v, &self.f) / f_norm).abs());
            }
        }
        worst
    }
}
