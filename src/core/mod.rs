pub mod traits;
pub mod wrappers;

pub use traits::{ComplexShiftSolve, InnerProduct, LinearOperator, RealShiftSolve};
pub use wrappers::FnOperator;
