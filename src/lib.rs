//! kreigs: implicitly restarted Krylov eigensolvers over Faer
//!
//! This crate computes a few eigenvalues and eigenvectors of large real operators that are only
//! available through matrix-vector products (or shifted solves). Symmetric operators use a
//! restarted Lanczos iteration and return real eigenpairs; general operators use a restarted
//! Arnoldi iteration and return complex eigenpairs. Shift-and-invert variants target eigenvalues
//! near a real or complex shift.
//!
//! # Example
//! ```rust,ignore
//! use kreigs::{DenseSymMatProd, EigenSolver, SelectionRule, SymEigsSolver};
//! let op = DenseSymMatProd::new(a.as_ref())?;
//! let mut solver = SymEigsSolver::new(&op, 3, 10)?;
//! solver.init()?;
//! solver.compute(1000, 1e-10, SelectionRule::LargestAlge)?;
//! let values = solver.eigenvalues()?;
//! ```

pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod krylov;
pub mod matrix;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use crate::config::*;
pub use crate::context::*;
pub use crate::core::*;
pub use crate::error::*;
pub use crate::matrix::*;
pub use crate::solver::*;
pub use crate::utils::*;

// Re-export EigsStats at the crate root for convenience
pub use utils::convergence::EigsStats;
