//! Matrix module: dense operator adapters (products and shift-and-invert solves).

pub mod dense;
pub use dense::{DenseGenMatProd, DenseSymMatProd};
pub mod shift_solve;
pub use shift_solve::{DenseGenComplexShiftSolve, DenseGenRealShiftSolve, DenseSymShiftSolve};
