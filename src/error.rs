use thiserror::Error;

// Unified error type for kreigs

#[derive(Error, Debug)]
pub enum EigsError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("Krylov breakdown: {found} usable basis vectors but {required} eigenvalues requested")]
    Breakdown { found: usize, required: usize },
    #[error("not converged after {iterations} restarts ({nconv} of {nev} Ritz pairs converged)")]
    NotConverged {
        iterations: usize,
        nconv: usize,
        nev: usize,
    },
    #[error("numerical issue: {0}")]
    NumericalIssue(String),
    #[error("no Ritz pairs available: compute() has not completed an extraction round")]
    NotReady,
    #[error("operator error: {0}")]
    Operator(String),
    // EvdError does not implement std::error::Error, so it is formatted with Debug.
    #[error("dense eigendecomposition failed: {0:?}")]
    Evd(faer::linalg::evd::EvdError),
}

impl From<faer::linalg::evd::EvdError> for EigsError {
    fn from(e: faer::linalg::evd::EvdError) -> Self {
        EigsError::Evd(e)
    }
}
