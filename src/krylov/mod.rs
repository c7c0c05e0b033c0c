//! Krylov machinery shared by the eigensolvers: factorization, Ritz extraction, shifted QR
//! and implicit restart.

pub mod factorization;
pub mod qr;
pub mod restart;
pub mod ritz;

pub use factorization::{Arnoldi, Extension, KrylovFactorization, Lanczos, Recurrence};
pub use ritz::RitzValue;
