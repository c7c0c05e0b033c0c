//! Convergence tracking & tolerance checks for the restarted eigensolvers.

/// ε^(2/3), the floor applied to |θ| in the residual test so that Ritz values near zero
/// can still converge.
pub fn ritz_precision() -> f64 {
    f64::EPSILON.powf(2.0 / 3.0)
}

/// Stopping criteria: relative tolerance on the Ritz residuals and a restart budget.
#[derive(Clone, Copy, Debug)]
pub struct Convergence {
    pub tol: f64,
    pub max_iters: usize,
}

impl Default for Convergence {
    fn default() -> Self {
        Self { tol: 1e-10, max_iters: 1000 }
    }
}

/// Outcome of a `compute` call.
#[derive(Clone, Debug, PartialEq)]
pub struct EigsStats {
    /// Restart cycles performed.
    pub iterations: usize,
    /// Operator applications performed since `init`.
    pub operations: usize,
    /// Wanted Ritz pairs that passed the residual test.
    pub nconv: usize,
    pub converged: bool,
}

impl Convergence {
    /// Per-pair convergence flags.
    ///
    /// `ritz_abs[i]` is |θ_i| and `last_abs[i]` is |y_i[p-1]|, the magnitude of the last component
    /// of the i-th eigenvector of the projected matrix. Pair i has converged when
    /// ‖f‖·|y_i[p-1]| ≤ tol·max(ε^(2/3), |θ_i|).
    pub fn check(&self, resid_norm: f64, ritz_abs: &[f64], last_abs: &[f64]) -> Vec<bool> {
        let prec = ritz_precision();
        ritz_abs
            .iter()
            .zip(last_abs)
            .map(|(&theta, &y)| resid_norm * y <= self.tol * theta.max(prec))
            .collect()
    }

    /// Whether the restart budget is used up after `iterations` restarts.
    pub fn exhausted(&self, iterations: usize) -> bool {
        iterations >= self.max_iters
    }
}
