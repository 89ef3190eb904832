//! Per-quadrature-point field data exchanged with residual kernels.
//!
//! Both types are fixed-size and `Copy`: one instance per field is reused
//! for every quadrature point of an assembly pass.

use seedbed_core::{EvalFlags, MAX_DIM};
use seedbed_mesh::CellValues;

/// Value, gradient and hessian of one field at one quadrature point.
///
/// Only the quantities the field's registry entry requests are populated;
/// the rest are zero. Scalar fields use component 0.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModelVariable {
    /// Components per point (1 for scalars, `dim` for vectors).
    pub components: usize,
    /// Spatial dimension.
    pub dim: usize,
    /// `value[c]`.
    pub value: [f64; MAX_DIM],
    /// `gradient[c][d]`.
    pub gradient: [[f64; MAX_DIM]; MAX_DIM],
    /// `hessian[c][d][e]`.
    pub hessian: [[[f64; MAX_DIM]; MAX_DIM]; MAX_DIM],
}

impl ModelVariable {
    /// A zeroed variable.
    pub fn new(components: usize, dim: usize) -> Self {
        Self {
            components,
            dim,
            ..Self::default()
        }
    }

    /// Scalar value.
    pub fn scalar(&self) -> f64 {
        self.value[0]
    }

    /// Scalar gradient (`dim` entries).
    pub fn scalar_gradient(&self) -> &[f64] {
        &self.gradient[0][..self.dim]
    }

    /// Vector value (`dim` entries).
    pub fn vector(&self) -> &[f64] {
        &self.value[..self.components]
    }

    /// Symmetric part of a vector field's gradient, `½(∇u + ∇uᵀ)`.
    pub fn symmetric_gradient(&self) -> [[f64; MAX_DIM]; MAX_DIM] {
        let mut e = [[0.0; MAX_DIM]; MAX_DIM];
        for i in 0..self.dim {
            for j in 0..self.dim {
                e[i][j] = 0.5 * (self.gradient[i][j] + self.gradient[j][i]);
            }
        }
        e
    }

    /// Load quadrature point `q` of `values`, zeroing what `flags` omits.
    pub(crate) fn load(&mut self, values: &CellValues, q: usize, flags: EvalFlags) {
        let dim = self.dim;
        *self = Self::new(self.components, dim);
        for c in 0..self.components {
            if flags.value {
                self.value[c] = values.value(q, c);
            }
            if flags.gradient {
                self.gradient[c][..dim].copy_from_slice(values.gradient(q, c));
            }
            if flags.hessian {
                let h = values.hessian(q, c);
                for d in 0..dim {
                    self.hessian[c][d][..dim].copy_from_slice(&h[d * dim..(d + 1) * dim]);
                }
            }
        }
    }
}

/// Value and gradient residual of one field at one quadrature point.
///
/// The assembler reads only the slots the field declared; anything a kernel
/// writes elsewhere is discarded.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ModelResidual {
    /// Tested against shape-function values: `value[c]`.
    pub value: [f64; MAX_DIM],
    /// Tested against shape-function gradients: `gradient[c][d]`.
    pub gradient: [[f64; MAX_DIM]; MAX_DIM],
}

impl ModelResidual {
    /// Set the scalar value residual.
    pub fn set_scalar(&mut self, v: f64) {
        self.value[0] = v;
    }

    /// Set the scalar gradient residual from `g` (`dim` entries).
    pub fn set_scalar_gradient(&mut self, g: &[f64]) {
        self.gradient[0][..g.len()].copy_from_slice(g);
    }

    /// Reset to zero.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
