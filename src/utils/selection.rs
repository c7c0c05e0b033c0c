//! Selection rules for wanted eigenvalues.
//!
//! A rule induces an ordering on scalars: the first `k` values in that ordering are the wanted
//! Ritz values, the rest are used as shifts when the factorization is restarted. All orderings
//! are computed with a stable sort, so ties keep the order produced by the dense eigensolver and
//! results are reproducible run to run.

use crate::error::EigsError;
use num_complex::Complex64;
use std::cmp::Ordering;
use std::str::FromStr;

/// Which eigenvalues to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionRule {
    /// Largest magnitude (absolute value, or modulus for complex values). Symmetric and general.
    LargestMagn,
    /// Largest real part. General solvers only.
    LargestReal,
    /// Largest imaginary part in magnitude. General solvers only.
    LargestImag,
    /// Largest algebraic value. Symmetric solvers only.
    LargestAlge,
    /// Smallest magnitude. Symmetric and general.
    SmallestMagn,
    /// Smallest real part. General solvers only.
    SmallestReal,
    /// Smallest imaginary part in magnitude. General solvers only.
    SmallestImag,
    /// Smallest algebraic value. Symmetric solvers only.
    SmallestAlge,
    /// Half from each end of the spectrum, one extra from the high end when `k` is odd.
    /// Symmetric solvers only.
    BothEnds,
}

impl SelectionRule {
    /// Whether the rule is meaningful for real (symmetric) spectra.
    pub fn valid_for_symmetric(self) -> bool {
        matches!(
            self,
            SelectionRule::LargestMagn
                | SelectionRule::LargestAlge
                | SelectionRule::SmallestMagn
                | SelectionRule::SmallestAlge
                | SelectionRule::BothEnds
        )
    }

    /// Whether the rule is meaningful for complex (general) spectra.
    pub fn valid_for_general(self) -> bool {
        matches!(
            self,
            SelectionRule::LargestMagn
                | SelectionRule::LargestReal
                | SelectionRule::LargestImag
                | SelectionRule::SmallestMagn
                | SelectionRule::SmallestReal
                | SelectionRule::SmallestImag
        )
    }

    /// Sort key for a real value; smaller keys come first.
    fn real_key(self, x: f64) -> f64 {
        match self {
            SelectionRule::LargestMagn => -x.abs(),
            SelectionRule::SmallestMagn => x.abs(),
            SelectionRule::LargestAlge | SelectionRule::LargestReal | SelectionRule::BothEnds => -x,
            SelectionRule::SmallestAlge | SelectionRule::SmallestReal => x,
            // a real value has no imaginary part to rank by
            SelectionRule::LargestImag | SelectionRule::SmallestImag => 0.0,
        }
    }

    /// Sort key for a complex value; smaller keys come first.
    ///
    /// Every key is invariant under conjugation, so both members of a conjugate pair rank equally.
    pub(crate) fn complex_key(self, z: Complex64) -> f64 {
        match self {
            SelectionRule::LargestMagn => -z.norm(),
            SelectionRule::SmallestMagn => z.norm(),
            SelectionRule::LargestReal | SelectionRule::LargestAlge | SelectionRule::BothEnds => -z.re,
            SelectionRule::SmallestReal | SelectionRule::SmallestAlge => z.re,
            SelectionRule::LargestImag => -z.im.abs(),
            SelectionRule::SmallestImag => z.im.abs(),
        }
    }

    /// Indices of `values` in selection order.
    pub fn sort_real(self, values: &[f64]) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..values.len()).collect();
        idx.sort_by(|&a, &b| self.real_key(values[a]).total_cmp(&self.real_key(values[b])));
        if self == SelectionRule::BothEnds {
            // idx is now in decreasing order; interleave the two ends
            let mut out = Vec::with_capacity(idx.len());
            let (mut lo, mut hi) = (0usize, idx.len());
            while lo < hi {
                out.push(idx[lo]);
                lo += 1;
                if lo < hi {
                    hi -= 1;
                    out.push(idx[hi]);
                }
            }
            return out;
        }
        idx
    }

    /// Compare two complex values under this rule.
    pub(crate) fn cmp_complex(self, a: Complex64, b: Complex64) -> Ordering {
        self.complex_key(a).total_cmp(&self.complex_key(b))
    }
}

impl FromStr for SelectionRule {
    type Err = EigsError;

    /// Parse the ARPACK-style `which` codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LM" => Ok(SelectionRule::LargestMagn),
            "LR" => Ok(SelectionRule::LargestReal),
            "LI" => Ok(SelectionRule::LargestImag),
            "LA" => Ok(SelectionRule::LargestAlge),
            "SM" => Ok(SelectionRule::SmallestMagn),
            "SR" => Ok(SelectionRule::SmallestReal),
            "SI" => Ok(SelectionRule::SmallestImag),
            "SA" => Ok(SelectionRule::SmallestAlge),
            "BE" => Ok(SelectionRule::BothEnds),
            other => Err(EigsError::Configuration(format!("unknown selection rule `{other}`"))),
        }
    }
}
