//! Options for the eigensolvers.
//!
//! `EigsOptions` carries everything a solve needs besides the operator: how many eigenvalues,
//! the subspace size, tolerance, restart budget, selection rule and an optional start vector.
//! Values can be set field by field or with the `with_*` builders; the rule can be parsed from
//! its ARPACK code (`"LM"`, `"SA"`, ...).

use crate::error::EigsError;
use crate::solver::validate_dims;
use crate::utils::selection::SelectionRule;

/// Eigensolver parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct EigsOptions {
    /// Number of wanted eigenvalues k.
    pub nev: usize,
    /// Krylov subspace size m, with k < m ≤ n.
    pub ncv: usize,
    /// Relative tolerance of the Ritz residual test.
    pub tol: f64,
    /// Maximum number of restart cycles.
    pub max_iter: usize,
    pub rule: SelectionRule,
    /// Start vector; a seeded random vector is used when absent.
    pub start: Option<Vec<f64>>,
}

impl Default for EigsOptions {
    fn default() -> Self {
        Self {
            nev: 6,
            ncv: 20,
            tol: 1e-10,
            max_iter: 1000,
            rule: SelectionRule::LargestMagn,
            start: None,
        }
    }
}

impl EigsOptions {
    /// `nev` eigenvalues with the common choice ncv = max(2·nev + 1, 20).
    pub fn new(nev: usize) -> Self {
        Self { nev, ncv: (2 * nev + 1).max(20), ..Self::default() }
    }

    pub fn with_ncv(mut self, ncv: usize) -> Self {
        self.ncv = ncv;
        self
    }

    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_rule(mut self, rule: SelectionRule) -> Self {
        self.rule = rule;
        self
    }

    /// Set the rule from an ARPACK code such as `"LM"` or `"SA"`.
    pub fn with_rule_code(self, code: &str) -> Result<Self, EigsError> {
        Ok(self.with_rule(code.parse()?))
    }

    pub fn with_start(mut self, v0: Vec<f64>) -> Self {
        self.start = Some(v0);
        self
    }

    /// Clamp `ncv` to the operator dimension and check all sizes against it.
    pub fn resolved_for(&self, n: usize) -> Result<Self, EigsError> {
        let mut out = self.clone();
        out.ncv = out.ncv.min(n);
        validate_dims(n, n, out.nev, out.ncv)?;
        if !out.tol.is_finite() || out.tol <= 0.0 {
            return Err(EigsError::Configuration(format!(
                "tolerance must be positive, got {}",
                out.tol
            )));
        }
        Ok(out)
    }
}
