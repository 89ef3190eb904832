//! One full nucleation step: detect, reconcile, broadcast, seed.

use crate::config::{LocalHistory, NucleationConfig};
use crate::detect::detect_against;
use crate::draws::UniformDraws;
use crate::error::NucleationError;
use crate::nucleus::Nucleus;
use crate::reconcile::{gather_candidates, reconcile};
use crate::seed::{broadcast_nuclei, seed_nuclei};
use crate::state::NucleationState;
use seedbed_comm::Communicator;
use seedbed_core::{FieldState, FieldType};
use seedbed_mesh::Mesh;
use tracing::{debug, info};

/// Outcome of one nucleation step on one partition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NucleationReport {
    /// The canonical list, identical on every partition.
    pub nuclei: Vec<Nucleus>,
    /// Candidates this partition accepted in this step.
    pub new_candidates: usize,
    /// Candidates this partition sent to the coordinator.
    pub local_candidates: usize,
    /// Points of this partition overwritten by the seeder.
    pub points_seeded: usize,
    /// Canonical nuclei whose window contains the current time.
    pub active: usize,
}

/// Run one nucleation step and seed `fields` in place.
///
/// Collective: every partition must call it with the same `time` and
/// `step`. Non-owned points are never written; the caller refreshes ghost
/// copies afterwards.
#[allow(clippy::too_many_arguments)]
pub fn advance(
    config: &NucleationConfig,
    mesh: &dyn Mesh,
    comm: &dyn Communicator,
    draws: &dyn UniformDraws,
    fields: &mut FieldState,
    state: &mut NucleationState,
    time: f64,
    step: u64,
) -> Result<NucleationReport, NucleationError> {
    for field in config.fields() {
        if fields.field_type(field) != Some(FieldType::Scalar) {
            return Err(NucleationError::NotScalar { field });
        }
    }
    let dim = mesh.dim();
    let points = mesh.support_points();

    match config.history {
        LocalHistory::PerStep => state.clear(),
        LocalHistory::UntilExpired => {
            let dropped = state.drop_expired(time);
            if dropped > 0 {
                debug!(dropped, time, "expired local candidates dropped");
            }
        }
        LocalHistory::Retain => {}
    }
    let found = detect_against(config, &points, &*fields, draws, time, step, state.local())?;
    let new_candidates = found.len();
    state.extend(found);

    let gathered = gather_candidates(comm, state.local(), dim)?;
    let canonical = gathered
        .map(|lists| reconcile(&lists, config.min_separation))
        .unwrap_or_default();
    let nuclei = broadcast_nuclei(comm, &canonical, dim)?;

    let points_seeded = seed_nuclei(config, &points, fields, &nuclei, time)?;
    let active = nuclei.iter().filter(|n| n.is_active(time)).count();
    if comm.rank() == 0 {
        info!(
            step,
            time,
            nuclei = nuclei.len(),
            active,
            "total number of nuclei currently seeded"
        );
    }

    Ok(NucleationReport {
        nuclei,
        new_candidates,
        local_candidates: state.local().len(),
        points_seeded,
        active,
    })
}
