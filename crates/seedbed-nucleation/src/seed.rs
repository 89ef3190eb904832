//! Distribution of the canonical list and seeding of the order parameter.

use crate::config::NucleationConfig;
use crate::error::NucleationError;
use crate::nucleus::Nucleus;
use crate::wire::{decode_nuclei, encode_nuclei};
use seedbed_comm::Communicator;
use seedbed_core::{distance, FieldWriter};
use seedbed_mesh::SupportPoint;

/// Send rank 0's canonical list to every rank.
///
/// `canonical` is read on rank 0 only. Every rank returns an identical,
/// freshly indexed copy. Collective.
pub fn broadcast_nuclei(
    comm: &dyn Communicator,
    canonical: &[Nucleus],
    dim: usize,
) -> Result<Vec<Nucleus>, NucleationError> {
    comm.barrier()?;
    let payload = if comm.rank() == 0 {
        encode_nuclei(canonical, dim)
    } else {
        Vec::new()
    };
    let bytes = comm.broadcast(0, payload)?;
    comm.barrier()?;
    Ok(decode_nuclei(&bytes, dim, 0)?)
}

/// Overwrite the seeded field around every nucleus active at `time`.
///
/// Owned points within `radius + margin` of an active nucleus receive the
/// tanh profile; all other points are left untouched. Where nuclei overlap
/// the later one in the list wins. Returns the number of writes.
pub fn seed_nuclei(
    config: &NucleationConfig,
    points: &[SupportPoint],
    fields: &mut dyn FieldWriter,
    nuclei: &[Nucleus],
    time: f64,
) -> Result<usize, NucleationError> {
    let mut written = 0;
    for nucleus in nuclei.iter().filter(|n| n.is_active(time)) {
        for p in points.iter().filter(|p| p.owned) {
            if p.coords.len() != nucleus.center.len() {
                return Err(NucleationError::DimensionMismatch {
                    expected: p.coords.len(),
                    actual: nucleus.center.len(),
                });
            }
            let r = distance(&p.coords, &nucleus.center);
            if let Some(v) = config.profile.value(r, nucleus.radius) {
                fields.write_dof(config.seeded_field, p.dof, v)?;
                written += 1;
            }
        }
    }
    Ok(written)
}
