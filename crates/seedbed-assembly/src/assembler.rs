//! The matrix-free assembler.
//!
//! All passes share one shape: for each cell, evaluate every participating
//! field as its registry entry requests; for each quadrature point, gather
//! the [`ModelVariable`](crate::ModelVariable) set and call the kernel;
//! then integrate and scatter the declared residual slots. Input field
//! state is only ever borrowed immutably.

use std::ops::Range;
use std::thread;

use seedbed_core::{EvalFlags, FieldId, FieldState};
use seedbed_mesh::{CellValues, Mesh};

use crate::energy::EnergyAccumulator;
use crate::error::AssemblyError;
use crate::kernel::ResidualKernel;
use crate::registry::{VariableInfo, VariableRegistry};
use crate::workspace::{submit, Workspace};

/// Drives a [`ResidualKernel`] over the cells of a [`Mesh`].
#[derive(Clone, Copy)]
pub struct Assembler<'a> {
    mesh: &'a dyn Mesh,
    registry: &'a VariableRegistry,
    kernel: &'a dyn ResidualKernel,
}

impl<'a> Assembler<'a> {
    /// Bind a mesh, a registry and a kernel.
    pub fn new(
        mesh: &'a dyn Mesh,
        registry: &'a VariableRegistry,
        kernel: &'a dyn ResidualKernel,
    ) -> Self {
        Self {
            mesh,
            registry,
            kernel,
        }
    }

    fn roster_components(&self) -> Vec<usize> {
        self.registry.rhs_infos().iter().map(|i| i.components).collect()
    }

    fn workspace(&self, infos: &[VariableInfo]) -> Workspace {
        Workspace::new(
            infos,
            &self.roster_components(),
            self.mesh.n_q_points(),
            self.mesh.dim(),
        )
    }

    fn check_roster(&self, state: &FieldState) -> Result<(), AssemblyError> {
        if state.field_count() != self.registry.field_count() {
            return Err(AssemblyError::RosterMismatch {
                expected: self.registry.field_count(),
                actual: state.field_count(),
            });
        }
        Ok(())
    }

    /// Explicit residuals of every field over `cells`, added into `dst`.
    ///
    /// Only fields that declared a residual output are written; `dst` is
    /// not cleared first.
    pub fn assemble_rhs(
        &self,
        state: &FieldState,
        dst: &mut FieldState,
        cells: Range<usize>,
    ) -> Result<(), AssemblyError> {
        self.check_roster(state)?;
        self.check_roster(dst)?;
        let infos = self.registry.rhs_infos();
        let mut ws = self.workspace(infos);

        for cell in cells {
            for (info, slot) in infos.iter().zip(ws.slots.iter_mut()) {
                if !info.needs.is_empty() {
                    self.mesh.evaluate(
                        info.field,
                        cell,
                        state.field(info.field)?,
                        info.needs,
                        &mut slot.values,
                    )?;
                }
                slot.residual.clear();
            }

            for q in 0..self.mesh.n_q_points() {
                ws.load_point(infos, q);
                ws.clear_residuals();
                self.kernel.residual_rhs(&ws.vars, &mut ws.residuals);
                for (info, slot) in infos.iter().zip(ws.slots.iter_mut()) {
                    submit(info, &ws.residuals[info.field.index()], q, &mut slot.residual);
                }
            }

            for (info, slot) in infos.iter().zip(&ws.slots) {
                if !info.residual.is_empty() {
                    self.mesh.integrate_add(
                        info.field,
                        cell,
                        &slot.residual,
                        info.residual,
                        dst.field_mut(info.field)?,
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Operator action for `target` over `cells`, added into `dst`.
    ///
    /// `trial` replaces the target's stored values; every other
    /// participating field is read from `state`.
    pub fn apply_lhs(
        &self,
        target: FieldId,
        trial: &[f64],
        state: &FieldState,
        dst: &mut [f64],
        cells: Range<usize>,
    ) -> Result<(), AssemblyError> {
        self.check_roster(state)?;
        let infos = self.registry.lhs_infos();
        let target_pos = infos
            .iter()
            .position(|i| i.field == target)
            .ok_or(AssemblyError::TargetNotInLhs { field: target })?;
        let expected = state.field(target)?.len();
        for (what, len) in [("trial vector", trial.len()), ("destination vector", dst.len())] {
            if len != expected {
                return Err(AssemblyError::VectorLength {
                    what,
                    expected,
                    actual: len,
                });
            }
        }
        let target_info = infos[target_pos];
        let mut ws = self.workspace(infos);

        for cell in cells {
            for (info, slot) in infos.iter().zip(ws.slots.iter_mut()) {
                if info.needs.is_empty() {
                    continue;
                }
                let src = if info.field == target {
                    trial
                } else {
                    state.field(info.field)?
                };
                self.mesh
                    .evaluate(info.field, cell, src, info.needs, &mut slot.values)?;
            }
            ws.slots[target_pos].residual.clear();

            for q in 0..self.mesh.n_q_points() {
                ws.load_point(infos, q);
                let out = &mut ws.residuals[target.index()];
                out.clear();
                self.kernel.residual_lhs(&ws.vars, target, out);
                submit(
                    &target_info,
                    &ws.residuals[target.index()],
                    q,
                    &mut ws.slots[target_pos].residual,
                );
            }

            self.mesh.integrate_add(
                target,
                cell,
                &ws.slots[target_pos].residual,
                target_info.residual,
                dst,
            )?;
        }
        Ok(())
    }

    /// Accumulate the kernel's energy density over `cells` into `acc`.
    ///
    /// Every field is evaluated for values and gradients.
    pub fn accumulate_energy(
        &self,
        state: &FieldState,
        cells: Range<usize>,
        acc: &mut EnergyAccumulator,
    ) -> Result<(), AssemblyError> {
        self.check_roster(state)?;
        let infos: Vec<VariableInfo> = self
            .registry
            .rhs_infos()
            .iter()
            .map(|i| VariableInfo {
                needs: EvalFlags::VALUE_GRADIENT,
                ..*i
            })
            .collect();
        let tracked = self.kernel.energy_tracked_field();
        let mut ws = self.workspace(&infos);

        for cell in cells {
            for (info, slot) in infos.iter().zip(ws.slots.iter_mut()) {
                self.mesh.evaluate(
                    info.field,
                    cell,
                    state.field(info.field)?,
                    info.needs,
                    &mut slot.values,
                )?;
            }
            for q in 0..self.mesh.n_q_points() {
                ws.load_point(&infos, q);
                let density = self.kernel.energy_density(&ws.vars).ok_or_else(|| {
                    AssemblyError::NoEnergyModel {
                        kernel: self.kernel.name().to_string(),
                    }
                })?;
                let gate = tracked.map(|f| ws.vars[f.index()].scalar());
                acc.add(&density, self.mesh.jxw(cell, q), gate);
            }
        }
        Ok(())
    }

    /// Energy over this partition's cells, split across `workers` threads.
    ///
    /// Each worker owns its accumulator over a contiguous chunk of cells;
    /// the chunks are merged in order once all workers finish.
    pub fn local_energy(
        &self,
        state: &FieldState,
        workers: usize,
        threshold: f64,
    ) -> Result<EnergyAccumulator, AssemblyError> {
        let cells = self.mesh.local_cells();
        let workers = workers.clamp(1, cells.len().max(1));
        if workers == 1 {
            let mut acc = EnergyAccumulator::new(threshold);
            self.accumulate_energy(state, cells, &mut acc)?;
            return Ok(acc);
        }

        let n = cells.len();
        let chunks: Vec<Range<usize>> = (0..workers)
            .map(|w| cells.start + n * w / workers..cells.start + n * (w + 1) / workers)
            .collect();
        let results: Vec<Result<EnergyAccumulator, AssemblyError>> = thread::scope(|s| {
            let handles: Vec<_> = chunks
                .into_iter()
                .map(|chunk| {
                    s.spawn(move || {
                        let mut acc = EnergyAccumulator::new(threshold);
                        self.accumulate_energy(state, chunk, &mut acc).map(|_| acc)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or(Err(AssemblyError::WorkerPanicked)))
                .collect()
        });

        let mut total = EnergyAccumulator::new(threshold);
        for r in results {
            total.merge(&r?);
        }
        Ok(total)
    }

    /// `∫ field dΩ` over `cells` for a scalar field.
    pub fn integrate_scalar(
        &self,
        field: FieldId,
        state: &FieldState,
        cells: Range<usize>,
    ) -> Result<f64, AssemblyError> {
        let info = self
            .registry
            .rhs_infos()
            .get(field.index())
            .ok_or(seedbed_core::FieldError::UnknownField { field })?;
        if !info.is_scalar {
            return Err(AssemblyError::NotScalar { field });
        }
        let mut values = CellValues::new(self.mesh.n_q_points(), 1, self.mesh.dim());
        let src = state.field(field)?;
        let mut sum = 0.0;
        for cell in cells {
            self.mesh
                .evaluate(field, cell, src, EvalFlags::VALUE, &mut values)?;
            for q in 0..self.mesh.n_q_points() {
                sum += values.value(q, 0) * self.mesh.jxw(cell, q);
            }
        }
        Ok(sum)
    }
}
