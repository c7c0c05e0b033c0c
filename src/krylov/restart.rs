//! Implicit restart: filter unwanted Ritz values out of the factorization.
//!
//! The shifts are applied to `H` one unit at a time (single-shift steps for real values,
//! double-shift steps for conjugate pairs) while the orthogonal transforms are accumulated in
//! `Q`. The factorization is then rotated by `Q` and truncated to the retained size, which
//! keeps A·V = V·H + f·e_kᵀ exact without a single operator application.

use crate::error::EigsError;
use crate::krylov::factorization::{KrylovFactorization, Recurrence};
use crate::krylov::qr::{double_shift_step, single_shift_step};
use crate::krylov::ritz::RitzValue;
use faer::Mat;
use log::trace;

impl<R: Recurrence> KrylovFactorization<R> {
    /// Apply `shifts` and compress the factorization to `keep` vectors.
    ///
    /// `keep` must satisfy 1 ≤ keep < p.
    pub fn restart(&mut self, shifts: &[RitzValue], keep: usize) -> Result<(), EigsError> {
        let p = self.len();
        if keep == 0 || keep >= p {
            return Err(EigsError::NumericalIssue(format!(
                "cannot restart a factorization of size {p} to size {keep}"
            )));
        }
        let mut h = self.projected();
        let mut q = Mat::<f64>::identity(p, p);
        for shift in shifts {
            match *shift {
                RitzValue::Real(mu) => single_shift_step(&mut h, &mut q, p, mu),
                RitzValue::ConjugatePair(z) => {
                    double_shift_step(&mut h, &mut q, p, 2.0 * z.re, z.norm_sqr())
                }
            }
        }
        R::tidy(&mut h, p);
        for j in 0..p {
            for i in 0..p {
                if !h[(i, j)].is_finite() || !q[(i, j)].is_finite() {
                    return Err(EigsError::NumericalIssue(
                        "shifted QR produced non-finite entries".to_string(),
                    ));
                }
            }
        }
        self.compress(&q, &h, keep);
        trace!("restarted with {} shift units, kept {keep} vectors", shifts.len());
        Ok(())
    }
}
