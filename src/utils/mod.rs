pub mod convergence;
pub mod random;
pub mod selection;

pub use convergence::{Convergence, EigsStats};
pub use selection::SelectionRule;
