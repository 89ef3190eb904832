//! Stiffness tensors in Voigt notation.
//!
//! Voigt ordering: 1D `[11]`, 2D `[11, 22, 12]`, 3D
//! `[11, 22, 33, 23, 13, 12]`. Strains enter with engineering shear
//! (`2ε_ij` off the diagonal); stresses come back as plain tensor entries.

use seedbed_core::MAX_DIM;

/// Largest Voigt vector length (3D).
const MAX_VOIGT: usize = 6;

/// A symmetric 3×3 tensor stored dense.
pub type Tensor2 = [[f64; MAX_DIM]; MAX_DIM];

const PAIRS_1D: [(usize, usize); 1] = [(0, 0)];
const PAIRS_2D: [(usize, usize); 3] = [(0, 0), (1, 1), (0, 1)];
const PAIRS_3D: [(usize, usize); 6] = [(0, 0), (1, 1), (2, 2), (1, 2), (0, 2), (0, 1)];

fn voigt_pairs(dim: usize) -> &'static [(usize, usize)] {
    match dim {
        1 => &PAIRS_1D,
        2 => &PAIRS_2D,
        _ => &PAIRS_3D,
    }
}

/// Voigt vector length for `dim`.
pub fn voigt_size(dim: usize) -> usize {
    voigt_pairs(dim).len()
}

/// How a phase's stiffness is specified.
#[derive(Clone, Debug, PartialEq)]
pub enum Stiffness {
    /// Young's modulus and Poisson ratio. 2D uses plane strain.
    Isotropic {
        /// Young's modulus `E`.
        youngs: f64,
        /// Poisson ratio `ν`.
        poisson: f64,
    },
    /// Row-major Voigt matrix of side [`voigt_size`]`(dim)`.
    Voigt(Vec<f64>),
}

/// A resolved Voigt stiffness matrix for one dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct VoigtMatrix {
    dim: usize,
    size: usize,
    c: [[f64; MAX_VOIGT]; MAX_VOIGT],
}

impl VoigtMatrix {
    /// Resolve `stiffness` for a `dim`-dimensional problem.
    pub fn from_stiffness(stiffness: &Stiffness, dim: usize) -> Result<Self, String> {
        if dim == 0 || dim > MAX_DIM {
            return Err(format!("dimension must be 1..={MAX_DIM}, got {dim}"));
        }
        let size = voigt_size(dim);
        let mut c = [[0.0; MAX_VOIGT]; MAX_VOIGT];
        match stiffness {
            Stiffness::Isotropic { youngs, poisson } => {
                if !youngs.is_finite() || *youngs <= 0.0 {
                    return Err(format!("youngs modulus must be finite and > 0, got {youngs}"));
                }
                if !poisson.is_finite() || *poisson <= -1.0 || *poisson >= 0.5 {
                    return Err(format!("poisson ratio must lie in (-1, 0.5), got {poisson}"));
                }
                let lambda = youngs * poisson / ((1.0 + poisson) * (1.0 - 2.0 * poisson));
                let mu = youngs / (2.0 * (1.0 + poisson));
                if dim == 1 {
                    c[0][0] = *youngs;
                } else {
                    for i in 0..dim {
                        for j in 0..dim {
                            c[i][j] = if i == j { lambda + 2.0 * mu } else { lambda };
                        }
                    }
                    for k in dim..size {
                        c[k][k] = mu;
                    }
                }
            }
            Stiffness::Voigt(entries) => {
                if entries.len() != size * size {
                    return Err(format!(
                        "voigt matrix for dim {dim} needs {} entries, got {}",
                        size * size,
                        entries.len()
                    ));
                }
                for i in 0..size {
                    for j in 0..size {
                        let v = entries[i * size + j];
                        if !v.is_finite() {
                            return Err(format!("voigt entry ({i}, {j}) must be finite, got {v}"));
                        }
                        c[i][j] = v;
                    }
                }
                for i in 0..size {
                    for j in (i + 1)..size {
                        if (c[i][j] - c[j][i]).abs() > 1e-12 * (c[i][j].abs() + c[j][i].abs()) {
                            return Err(format!("voigt matrix is not symmetric at ({i}, {j})"));
                        }
                    }
                }
            }
        }
        Ok(Self { dim, size, c })
    }

    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Entry `(i, j)` of the Voigt matrix.
    pub fn entry(&self, i: usize, j: usize) -> f64 {
        self.c[i][j]
    }

    /// `(1 − t)·self + t·other`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let mut c = [[0.0; MAX_VOIGT]; MAX_VOIGT];
        for (i, row) in c.iter_mut().enumerate().take(self.size) {
            for (j, v) in row.iter_mut().enumerate().take(self.size) {
                *v = (1.0 - t) * self.c[i][j] + t * other.c[i][j];
            }
        }
        Self { c, ..*self }
    }

    /// `other − self`.
    pub fn difference(&self, other: &Self) -> Self {
        let mut c = [[0.0; MAX_VOIGT]; MAX_VOIGT];
        for (i, row) in c.iter_mut().enumerate().take(self.size) {
            for (j, v) in row.iter_mut().enumerate().take(self.size) {
                *v = other.c[i][j] - self.c[i][j];
            }
        }
        Self { c, ..*self }
    }

    /// Stress `C : strain`.
    pub fn stress(&self, strain: &Tensor2) -> Tensor2 {
        let pairs = voigt_pairs(self.dim);
        let mut e = [0.0; MAX_VOIGT];
        for (k, &(i, j)) in pairs.iter().enumerate() {
            e[k] = if i == j { strain[i][j] } else { 2.0 * strain[i][j] };
        }
        let mut s = [[0.0; MAX_DIM]; MAX_DIM];
        for (k, &(i, j)) in pairs.iter().enumerate() {
            let sk: f64 = (0..self.size).map(|l| self.c[k][l] * e[l]).sum();
            s[i][j] = sk;
            s[j][i] = sk;
        }
        s
    }
}

/// `A : B` over the leading `dim × dim` block.
pub fn double_contract(a: &Tensor2, b: &Tensor2, dim: usize) -> f64 {
    let mut sum = 0.0;
    for i in 0..dim {
        for j in 0..dim {
            sum += a[i][j] * b[i][j];
        }
    }
    sum
}
