//! Ritz pair extraction from the projected matrix.
//!
//! The projected matrix `H` is small (at most m×m), so its full eigendecomposition is delegated
//! to faer. Results are reordered by the active [`SelectionRule`]: the first `k` entries are the
//! wanted pairs, the rest are the shifts for the next restart.
//!
//! For a general `H`, complex Ritz values come in conjugate pairs. A pair is ranked and split
//! off as a single [`RitzValue::ConjugatePair`] unit, so the wanted set never contains one half
//! of a pair and the shift set can always be applied with real arithmetic.

use crate::error::EigsError;
use crate::utils::selection::SelectionRule;
use faer::{Mat, Side};
use num_complex::Complex64;

/// A shift unit: a real Ritz value or a conjugate pair, stored by its member with positive
/// imaginary part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RitzValue {
    Real(f64),
    ConjugatePair(Complex64),
}

impl RitzValue {
    /// Number of scalar eigenvalues the unit stands for.
    pub fn size(&self) -> usize {
        match self {
            RitzValue::Real(_) => 1,
            RitzValue::ConjugatePair(_) => 2,
        }
    }

    fn representative(&self) -> Complex64 {
        match *self {
            RitzValue::Real(x) => Complex64::new(x, 0.0),
            RitzValue::ConjugatePair(z) => z,
        }
    }
}

/// Eigenpairs of a symmetric projected matrix in selection order.
pub struct SymRitz {
    pub values: Vec<f64>,
    /// Column `i` is the unit eigenvector for `values[i]`.
    pub vectors: Mat<f64>,
}

impl SymRitz {
    /// Real shifts: every value from position `keep` on.
    pub fn shifts(&self, keep: usize) -> Vec<RitzValue> {
        self.values[keep..].iter().map(|&x| RitzValue::Real(x)).collect()
    }
}

/// Eigendecomposition of a symmetric tridiagonal `h`, ordered by `rule`.
pub fn symmetric_ritz(h: &Mat<f64>, rule: SelectionRule) -> Result<SymRitz, EigsError> {
    let p = h.nrows();
    let evd = h.as_ref().self_adjoint_eigen(Side::Lower)?;
    let s = evd.S();
    let u = evd.U();
    let raw: Vec<f64> = (0..p).map(|i| s[i]).collect();
    let order = rule.sort_real(&raw);
    let values = order.iter().map(|&i| raw[i]).collect();
    let vectors = Mat::from_fn(p, p, |r, c| u[(r, order[c])]);
    Ok(SymRitz { values, vectors })
}

/// Eigenpairs of a general projected matrix in selection order, grouped into shift units.
pub struct GenRitz {
    /// Scalar Ritz values; a conjugate pair occupies two consecutive slots, +imag first.
    pub values: Vec<Complex64>,
    /// `vectors[i]` is the eigenvector (length p) for `values[i]`.
    pub vectors: Vec<Vec<Complex64>>,
    units: Vec<RitzValue>,
}

impl GenRitz {
    /// Number of leading scalar values to retain when `k` are wanted.
    ///
    /// Equal to `k` unless position `k` would split a conjugate pair; then `k + 1` if that still
    /// leaves at least one shift, otherwise `k − 1`.
    pub fn retained(&self, k: usize) -> usize {
        let mut count = 0;
        for unit in &self.units {
            if count >= k {
                break;
            }
            count += unit.size();
        }
        if count > k && count >= self.values.len() {
            count - 2
        } else {
            count
        }
    }

    /// Shift units after the first `keep` scalar values. `keep` must fall on a unit boundary.
    pub fn shifts(&self, keep: usize) -> Vec<RitzValue> {
        let mut count = 0;
        let mut out = Vec::new();
        for unit in &self.units {
            if count >= keep {
                out.push(*unit);
            }
            count += unit.size();
        }
        out
    }
}

fn is_real(z: Complex64) -> bool {
    z.im.abs() <= f64::EPSILON.powf(2.0 / 3.0) * z.norm()
}

/// Eigendecomposition of an upper Hessenberg `h`, ordered by `rule`.
pub fn general_ritz(h: &Mat<f64>, rule: SelectionRule) -> Result<GenRitz, EigsError> {
    let p = h.nrows();
    let evd = h.as_ref().eigen()?;
    let s = evd.S();
    let u = evd.U();
    let raw: Vec<Complex64> = (0..p)
        .map(|i| {
            let z = s[i];
            Complex64::new(z.re, z.im)
        })
        .collect();
    let column = |j: usize| -> Vec<Complex64> {
        let mut y: Vec<Complex64> = (0..p)
            .map(|i| {
                let z = u[(i, j)];
                Complex64::new(z.re, z.im)
            })
            .collect();
        let norm = y.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
        if norm > 0.0 {
            y.iter_mut().for_each(|z| *z /= norm);
        }
        y
    };

    // group into units, remembering the eigenvector columns of each
    let mut used = vec![false; p];
    let mut units: Vec<(RitzValue, usize, Option<usize>)> = Vec::with_capacity(p);
    for i in 0..p {
        if used[i] {
            continue;
        }
        used[i] = true;
        let z = raw[i];
        if is_real(z) {
            units.push((RitzValue::Real(z.re), i, None));
            continue;
        }
        let target = z.conj();
        let partner = (0..p)
            .filter(|&j| !used[j] && !is_real(raw[j]) && raw[j].im * z.im < 0.0)
            .min_by(|&a, &b| (raw[a] - target).norm().total_cmp(&(raw[b] - target).norm()))
            .ok_or_else(|| {
                EigsError::NumericalIssue(format!("complex Ritz value {z} has no conjugate partner"))
            })?;
        used[partner] = true;
        let (plus, minus) = if z.im > 0.0 { (i, partner) } else { (partner, i) };
        units.push((RitzValue::ConjugatePair(raw[plus]), plus, Some(minus)));
    }
    units.sort_by(|a, b| rule.cmp_complex(a.0.representative(), b.0.representative()));

    let mut values = Vec::with_capacity(p);
    let mut vectors = Vec::with_capacity(p);
    for &(unit, first, second) in &units {
        match unit {
            RitzValue::Real(x) => {
                values.push(Complex64::new(x, 0.0));
                // a real eigenvalue of a real matrix has a real eigenvector up to a phase
                vectors.push(real_phase(column(first)));
            }
            RitzValue::ConjugatePair(z) => {
                let minus = second.unwrap_or(first);
                values.push(z);
                vectors.push(column(first));
                values.push(raw[minus]);
                vectors.push(column(minus));
            }
        }
    }
    Ok(GenRitz {
        values,
        vectors,
        units: units.into_iter().map(|(unit, _, _)| unit).collect(),
    })
}

/// Rotate `v` by a unit phase so its largest entry is real and positive, then drop the
/// imaginary residue.
fn real_phase(mut v: Vec<Complex64>) -> Vec<Complex64> {
    let pivot = v
        .iter()
        .copied()
        .max_by(|a, b| a.norm().total_cmp(&b.norm()))
        .unwrap_or(Complex64::new(1.0, 0.0));
    let r = pivot.norm();
    if r > 0.0 {
        let phase = pivot.conj() / r;
        for z in v.iter_mut() {
            *z = Complex64::new((*z * phase).re, 0.0);
        }
    }
    v
}
