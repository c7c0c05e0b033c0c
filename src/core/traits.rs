//! Core operator and linear-algebra traits for kreigs.

use crate::error::EigsError;
use num_complex::Complex64;

/// Operator application: y ← A x.
///
/// This is the only thing the eigensolvers know about the operator. It must be a pure
/// function of `x` for the duration of one `compute` call.
pub trait LinearOperator {
    /// Number of rows of the operator.
    fn nrows(&self) -> usize;
    /// Number of columns of the operator.
    fn ncols(&self) -> usize;
    /// Compute y = A · x. `x.len() == ncols()`, `y.len() == nrows()`.
    fn apply(&self, x: &[f64], y: &mut [f64]) -> Result<(), EigsError>;
}

/// Shift-and-invert with a real shift: after `set_shift(σ)`, `apply` computes y = (A − σI)⁻¹ x.
pub trait RealShiftSolve: LinearOperator {
    /// Factorize A − σI for subsequent `apply` calls.
    fn set_shift(&mut self, sigma: f64) -> Result<(), EigsError>;
}

/// Shift-and-invert with a complex shift σ = σr + iσi.
///
/// `apply` computes the real operator y = Re[(A − σI)⁻¹ x].
pub trait ComplexShiftSolve: LinearOperator {
    /// Factorize A − σI for subsequent `apply` and `solve_complex` calls.
    fn set_shift(&mut self, sigmar: f64, sigmai: f64) -> Result<(), EigsError>;
    /// Compute y = (A − σI)⁻¹ x for a complex right-hand side.
    fn solve_complex(&self, x: &[Complex64], y: &mut [Complex64]) -> Result<(), EigsError>;
}

/// Inner products & norms.
pub trait InnerProduct<V: ?Sized> {
    /// Associated scalar type.
    type Scalar: Copy + PartialOrd + From<f64>;
    /// Compute dot(x, y).
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖₂.
    fn norm(&self, x: &V) -> Self::Scalar;
}
