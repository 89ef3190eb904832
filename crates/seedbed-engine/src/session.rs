//! Per-partition simulation session.
//!
//! [`Session`] owns one partition's mesh, communicator, kernel and
//! variable registry, and exposes the operations a time-stepping driver
//! calls each step. Every operation is collective: all partitions call it
//! in the same order with the same arguments, and every partition sees the
//! same globally reduced result.
//!
//! # Ghost copies
//!
//! [`FieldState`] holds every mesh point on every partition. A partition
//! only writes the points it owns; the reductions below rebuild the
//! remaining entries so all partitions leave each operation with identical
//! state.

use seedbed_assembly::{
    Assembler, EnergyTotals, RegistryError, ResidualKernel, VariableRegistry,
};
use seedbed_comm::Communicator;
use seedbed_core::{EvalFlags, FieldId, FieldState, ResidualFlags};
use seedbed_mesh::Mesh;
use seedbed_nucleation::{
    advance, ChaChaDraws, NucleationConfig, NucleationReport, NucleationState, UniformDraws,
};
use tracing::{debug, info};

use crate::config::{ConfigError, SessionConfig};
use crate::error::{SessionError, Stage};

const _: () = {
    #[allow(dead_code)]
    fn assert_send<T: Send>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send::<Session>();
    }
};

/// Nucleation policy together with the state it carries between steps.
struct Nucleation {
    config: NucleationConfig,
    state: NucleationState,
}

/// One partition's view of a running simulation.
///
/// Created from a [`SessionConfig`] via [`new()`](Session::new). The
/// session is `Send` but not `Sync`: the communicator endpoint belongs to
/// exactly one thread at a time.
pub struct Session {
    mesh: Box<dyn Mesh>,
    comm: Box<dyn Communicator>,
    kernel: Box<dyn ResidualKernel>,
    registry: VariableRegistry,
    nucleation: Option<Nucleation>,
    draws: Box<dyn UniformDraws>,
    energy_workers: usize,
    energy_threshold: f64,
}

impl Session {
    /// Validate `config` and build the registry.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let registry = config.validate()?;
        let SessionConfig {
            mesh,
            comm,
            kernel,
            nucleation,
            draws,
            energy_workers,
            energy_threshold,
            ..
        } = config;
        let seed = nucleation.as_ref().map_or(0, |n| n.seed);
        let draws = draws.unwrap_or_else(|| Box::new(ChaChaDraws::new(seed)));
        info!(
            kernel = kernel.name(),
            rank = comm.rank(),
            size = comm.size(),
            fields = registry.field_count(),
            nucleation = nucleation.is_some(),
            "session created"
        );
        Ok(Self {
            mesh,
            comm,
            kernel,
            registry,
            nucleation: nucleation.map(|config| Nucleation {
                config,
                state: NucleationState::new(),
            }),
            draws,
            energy_workers: energy_workers.max(1),
            energy_threshold,
        })
    }

    /// A zeroed field state for this session's roster.
    pub fn new_state(&self) -> FieldState {
        FieldState::zeros(self.registry.fields(), self.mesh.n_points(), self.mesh.dim())
    }

    /// The variable registry.
    pub fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// This partition's mesh.
    pub fn mesh(&self) -> &dyn Mesh {
        &*self.mesh
    }

    /// This partition's rank.
    pub fn rank(&self) -> usize {
        self.comm.rank()
    }

    /// Retained nucleation candidates, if nucleation is configured.
    pub fn nucleation_state(&self) -> Option<&NucleationState> {
        self.nucleation.as_ref().map(|n| &n.state)
    }

    /// Change a field's operator-pass requirements.
    ///
    /// The registry is left unchanged if the kernel cannot honour the new
    /// requirements.
    pub fn set_lhs_requirements(
        &mut self,
        field: FieldId,
        lhs: EvalFlags,
        lhs_residual: ResidualFlags,
    ) -> Result<(), RegistryError> {
        let mut updated = self.registry.clone();
        updated.set_lhs_requirements(field, lhs, lhs_residual)?;
        updated.check_kernel(&*self.kernel)?;
        self.registry = updated;
        Ok(())
    }

    fn assembler(&self) -> Assembler<'_> {
        Assembler::new(&*self.mesh, &self.registry, &*self.kernel)
    }

    /// Explicit residuals of every field, summed across partitions.
    ///
    /// Fields that declare no residual output come back as zeros.
    pub fn assemble_rhs(&self, state: &FieldState) -> Result<FieldState, SessionError> {
        let mut dst = state.zeros_like();
        self.assembler()
            .assemble_rhs(state, &mut dst, self.mesh.local_cells())
            .map_err(SessionError::assembly(Stage::Assembly))?;
        for buf in dst.buffers_mut() {
            self.comm
                .all_reduce_sum(buf)
                .map_err(SessionError::comm(Stage::Assembly))?;
        }
        debug!(cells = self.mesh.local_cells().len(), "explicit residuals assembled");
        Ok(dst)
    }

    /// Operator action on `trial` for `target`, summed across partitions.
    pub fn apply_lhs_operator(
        &self,
        target: FieldId,
        trial: &[f64],
        state: &FieldState,
    ) -> Result<Vec<f64>, SessionError> {
        let mut dst = vec![0.0; trial.len()];
        self.assembler()
            .apply_lhs(target, trial, state, &mut dst, self.mesh.local_cells())
            .map_err(SessionError::assembly(Stage::Operator))?;
        self.comm
            .all_reduce_sum(&mut dst)
            .map_err(SessionError::comm(Stage::Operator))?;
        Ok(dst)
    }

    /// Detect, reconcile, broadcast and seed, mutating `state` in place.
    ///
    /// Without a nucleation policy this returns an empty report and
    /// performs no communication.
    pub fn advance_nucleation(
        &mut self,
        time: f64,
        step: u64,
        state: &mut FieldState,
    ) -> Result<NucleationReport, SessionError> {
        let Some(nucleation) = self.nucleation.as_mut() else {
            return Ok(NucleationReport::default());
        };
        let report = advance(
            &nucleation.config,
            &*self.mesh,
            &*self.comm,
            &*self.draws,
            state,
            &mut nucleation.state,
            time,
            step,
        )?;
        let seeded = nucleation.config.seeded_field;
        self.refresh_ghosts(seeded, state)
            .map_err(SessionError::comm(Stage::Nucleation))?;
        Ok(report)
    }

    /// Rebuild the non-owned entries of a scalar field from their owners.
    fn refresh_ghosts(
        &self,
        field: FieldId,
        state: &mut FieldState,
    ) -> Result<(), seedbed_comm::CommError> {
        if self.comm.size() == 1 {
            return Ok(());
        }
        // `advance` has already checked that the field exists.
        let Ok(values) = state.field_mut(field) else {
            return Ok(());
        };
        for (p, v) in values.iter_mut().enumerate() {
            if !self.mesh.is_owned(p) {
                *v = 0.0;
            }
        }
        self.comm.all_reduce_sum(values)
    }

    /// Total free energy and its decomposition, summed across partitions.
    pub fn compute_energy(&self, state: &FieldState) -> Result<EnergyTotals, SessionError> {
        let acc = self
            .assembler()
            .local_energy(state, self.energy_workers, self.energy_threshold)
            .map_err(SessionError::assembly(Stage::Energy))?;
        if acc.non_finite() > 0 {
            debug!(skipped = acc.non_finite(), "non-finite energy densities skipped");
        }
        let mut totals = acc.totals().to_array();
        self.comm
            .all_reduce_sum(&mut totals)
            .map_err(SessionError::comm(Stage::Energy))?;
        Ok(EnergyTotals::from_array(totals))
    }

    /// `∫ field dΩ` over the whole domain for a scalar field.
    pub fn integrate_field(&self, field: FieldId, state: &FieldState) -> Result<f64, SessionError> {
        let local = self
            .assembler()
            .integrate_scalar(field, state, self.mesh.local_cells())
            .map_err(SessionError::assembly(Stage::Integration))?;
        self.comm
            .reduce_sum(local)
            .map_err(SessionError::comm(Stage::Integration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedbed_assembly::AssemblyError;
    use seedbed_comm::SerialComm;
    use seedbed_mesh::StructuredGrid;
    use seedbed_models::{MaterialModel, OrderParameter};

    fn session() -> Session {
        let mesh = StructuredGrid::new(&[4, 4], &[1.0, 1.0]).unwrap();
        let model = MaterialModel::builder(2)
            .matrix_energy(vec![0.0, 0.0, 1.0])
            .precipitate_energy(vec![0.5, -1.0, 1.0])
            .order_parameter(OrderParameter::isotropic("n1", 0.01))
            .mobilities(1.0, 1.0)
            .dt(0.01)
            .build()
            .unwrap();
        let cfg =
            SessionConfig::coupled(Box::new(mesh), Box::new(SerialComm::new()), model).unwrap();
        Session::new(cfg).unwrap()
    }

    #[test]
    fn field_integral_of_constant_is_value_times_area() {
        let s = session();
        let mut state = s.new_state();
        state.fill(FieldId(0), 0.25).unwrap();
        let m = s.integrate_field(FieldId(0), &state).unwrap();
        assert!((m - 0.25).abs() < 1e-14);
    }

    #[test]
    fn operator_on_non_lhs_field_reports_stage() {
        let s = session();
        let state = s.new_state();
        let trial = vec![0.0; s.mesh().n_points()];
        let err = s.apply_lhs_operator(FieldId(0), &trial, &state).unwrap_err();
        assert_eq!(
            err,
            SessionError::Assembly {
                stage: Stage::Operator,
                source: AssemblyError::TargetNotInLhs { field: FieldId(0) },
            }
        );
    }

    #[test]
    fn rejected_lhs_change_leaves_registry_untouched() {
        let mut s = session();
        let err = s
            .set_lhs_requirements(FieldId(0), EvalFlags::ALL, ResidualFlags::VALUE)
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedDerivative { .. }));
        assert!(s.registry().lhs_infos().is_empty());
    }

    #[test]
    fn nucleation_without_policy_is_a_no_op() {
        let mut s = session();
        let mut state = s.new_state();
        state.fill(FieldId(0), 0.9).unwrap();
        let before = state.clone();
        let report = s.advance_nucleation(1.0, 3, &mut state).unwrap();
        assert_eq!(report, NucleationReport::default());
        assert_eq!(state, before);
        assert!(s.nucleation_state().is_none());
    }
}
