//! Per-cell evaluation and residual buffers.
//!
//! Both buffers are sized once per assembly pass and reused for every
//! cell, so the cell loop performs no allocation.

/// Field quantities at every quadrature point of one cell.
///
/// Layout: values `[q][c]`, gradients `[q][c][d]`, hessians `[q][c][d][e]`,
/// flattened row-major.
#[derive(Clone, Debug)]
pub struct CellValues {
    n_q: usize,
    components: usize,
    dim: usize,
    values: Vec<f64>,
    gradients: Vec<f64>,
    hessians: Vec<f64>,
}

impl CellValues {
    /// Buffers for a field with `components` slots per point.
    pub fn new(n_q: usize, components: usize, dim: usize) -> Self {
        Self {
            n_q,
            components,
            dim,
            values: vec![0.0; n_q * components],
            gradients: vec![0.0; n_q * components * dim],
            hessians: vec![0.0; n_q * components * dim * dim],
        }
    }

    /// Number of quadrature points.
    pub fn n_q_points(&self) -> usize {
        self.n_q
    }

    /// Components per point.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Value of component `c` at point `q`.
    pub fn value(&self, q: usize, c: usize) -> f64 {
        self.values[q * self.components + c]
    }

    /// Gradient of component `c` at point `q` (`dim` entries).
    pub fn gradient(&self, q: usize, c: usize) -> &[f64] {
        let start = (q * self.components + c) * self.dim;
        &self.gradients[start..start + self.dim]
    }

    /// Hessian of component `c` at point `q` (`dim * dim` entries, row-major).
    pub fn hessian(&self, q: usize, c: usize) -> &[f64] {
        let dd = self.dim * self.dim;
        let start = (q * self.components + c) * dd;
        &self.hessians[start..start + dd]
    }

    /// Mutable value slot, for mesh implementations.
    pub fn value_mut(&mut self, q: usize, c: usize) -> &mut f64 {
        &mut self.values[q * self.components + c]
    }

    /// Mutable gradient slots, for mesh implementations.
    pub fn gradient_mut(&mut self, q: usize, c: usize) -> &mut [f64] {
        let start = (q * self.components + c) * self.dim;
        &mut self.gradients[start..start + self.dim]
    }

    /// Mutable hessian slots, for mesh implementations.
    pub fn hessian_mut(&mut self, q: usize, c: usize) -> &mut [f64] {
        let dd = self.dim * self.dim;
        let start = (q * self.components + c) * dd;
        &mut self.hessians[start..start + dd]
    }
}

/// Residual contributions at every quadrature point of one cell.
///
/// Layout matches [`CellValues`] minus the hessian block.
#[derive(Clone, Debug)]
pub struct CellResidual {
    n_q: usize,
    components: usize,
    dim: usize,
    values: Vec<f64>,
    gradients: Vec<f64>,
}

impl CellResidual {
    /// Buffers for a field with `components` slots per point.
    pub fn new(n_q: usize, components: usize, dim: usize) -> Self {
        Self {
            n_q,
            components,
            dim,
            values: vec![0.0; n_q * components],
            gradients: vec![0.0; n_q * components * dim],
        }
    }

    /// Number of quadrature points.
    pub fn n_q_points(&self) -> usize {
        self.n_q
    }

    /// Components per point.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Zero every slot.
    pub fn clear(&mut self) {
        self.values.fill(0.0);
        self.gradients.fill(0.0);
    }

    /// Submit the value residual of component `c` at point `q`.
    pub fn submit_value(&mut self, q: usize, c: usize, v: f64) {
        self.values[q * self.components + c] = v;
    }

    /// Submit the gradient residual of component `c` at point `q`.
    pub fn submit_gradient(&mut self, q: usize, c: usize, g: &[f64]) {
        let start = (q * self.components + c) * self.dim;
        self.gradients[start..start + self.dim].copy_from_slice(&g[..self.dim]);
    }

    /// Value residual of component `c` at point `q`.
    pub fn value(&self, q: usize, c: usize) -> f64 {
        self.values[q * self.components + c]
    }

    /// Gradient residual of component `c` at point `q`.
    pub fn gradient(&self, q: usize, c: usize) -> &[f64] {
        let start = (q * self.components + c) * self.dim;
        &self.gradients[start..start + self.dim]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_do_not_overlap() {
        let mut v = CellValues::new(4, 2, 2);
        *v.value_mut(3, 1) = 1.0;
        v.gradient_mut(3, 1).copy_from_slice(&[2.0, 3.0]);
        v.hessian_mut(0, 1)[3] = 4.0;
        assert_eq!(v.value(3, 1), 1.0);
        assert_eq!(v.value(3, 0), 0.0);
        assert_eq!(v.gradient(3, 1), &[2.0, 3.0]);
        assert_eq!(v.gradient(3, 0), &[0.0, 0.0]);
        assert_eq!(v.hessian(0, 1), &[0.0, 0.0, 0.0, 4.0]);
    }

    #[test]
    fn residual_clear_resets_submissions() {
        let mut r = CellResidual::new(2, 1, 3);
        r.submit_value(1, 0, 5.0);
        r.submit_gradient(0, 0, &[1.0, 2.0, 3.0]);
        assert_eq!(r.gradient(0, 0), &[1.0, 2.0, 3.0]);
        r.clear();
        assert_eq!(r.value(1, 0), 0.0);
        assert_eq!(r.gradient(0, 0), &[0.0, 0.0, 0.0]);
    }
}
