//! Context module: factory types that configure and run an eigensolver in one call.
//!
//! Modules:
//! - [`eigs_context`]: the `EigsContext` struct selecting the solver by [`EigsKind`].
//!
//! # Example
//! ```rust,ignore
//! use kreigs::{EigsContext, EigsKind, EigsOptions};
//! let ctx = EigsContext::new(EigsKind::Symmetric, a, EigsOptions::new(4));
//! let pairs = ctx.solve_context()?;
//! ```

pub mod eigs_context;
pub use eigs_context::{EigenPairs, EigsContext, EigsKind};
