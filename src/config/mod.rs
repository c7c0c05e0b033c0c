pub mod options;
pub use options::EigsOptions;
