//! Reusable per-pass buffers.
//!
//! One [`Workspace`] is allocated per assembly call and reused for every
//! cell, so the cell and quadrature loops do not touch the heap.

use seedbed_mesh::{CellResidual, CellValues};

use crate::registry::VariableInfo;
use crate::variable::{ModelResidual, ModelVariable};

/// Evaluation and residual buffers for one field.
pub(crate) struct FieldSlot {
    pub(crate) values: CellValues,
    pub(crate) residual: CellResidual,
}

/// Buffers for one assembly pass.
///
/// `slots` follows the pass's [`VariableInfo`] table; `vars` and
/// `residuals` are indexed by roster position, as kernels expect.
pub(crate) struct Workspace {
    pub(crate) slots: Vec<FieldSlot>,
    pub(crate) vars: Vec<ModelVariable>,
    pub(crate) residuals: Vec<ModelResidual>,
}

impl Workspace {
    pub(crate) fn new(
        infos: &[VariableInfo],
        roster_components: &[usize],
        n_q: usize,
        dim: usize,
    ) -> Self {
        Self {
            slots: infos
                .iter()
                .map(|i| FieldSlot {
                    values: CellValues::new(n_q, i.components, dim),
                    residual: CellResidual::new(n_q, i.components, dim),
                })
                .collect(),
            vars: roster_components
                .iter()
                .map(|c| ModelVariable::new(*c, dim))
                .collect(),
            residuals: vec![ModelResidual::default(); roster_components.len()],
        }
    }

    /// Copy quadrature point `q` of every slot into `vars`.
    pub(crate) fn load_point(&mut self, infos: &[VariableInfo], q: usize) {
        for (info, slot) in infos.iter().zip(&self.slots) {
            self.vars[info.field.index()].load(&slot.values, q, info.needs);
        }
    }

    pub(crate) fn clear_residuals(&mut self) {
        self.residuals.iter_mut().for_each(ModelResidual::clear);
    }
}

/// Copy the declared slots of `r` into point `q` of `out`.
pub(crate) fn submit(info: &VariableInfo, r: &ModelResidual, q: usize, out: &mut CellResidual) {
    for c in 0..info.components {
        if info.residual.value {
            out.submit_value(q, c, r.value[c]);
        }
        if info.residual.gradient {
            out.submit_gradient(q, c, &r.gradient[c]);
        }
    }
}
