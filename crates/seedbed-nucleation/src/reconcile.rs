//! Cross-partition gather and global deduplication.

use crate::error::NucleationError;
use crate::nucleus::{reindex, Nucleus};
use crate::wire::{decode_nuclei, encode_nuclei, COUNT_TAG, RECORDS_TAG};
use seedbed_comm::codec::{read_u32_le, write_u32_le};
use seedbed_comm::{CommError, Communicator};
use tracing::debug;

/// Collect every partition's candidates on rank 0.
///
/// Every rank announces its count, then ranks with candidates send their
/// records. Rank 0 checks each decoded list against the announced count.
/// Returns `Some(lists)` indexed by rank on rank 0 and `None` elsewhere.
/// Collective: every rank must call it.
pub fn gather_candidates(
    comm: &dyn Communicator,
    local: &[Nucleus],
    dim: usize,
) -> Result<Option<Vec<Vec<Nucleus>>>, NucleationError> {
    let rank = comm.rank();
    let size = comm.size();

    let mut counts = vec![0usize; size];
    if rank == 0 {
        counts[0] = local.len();
        for (peer, count) in counts.iter_mut().enumerate().skip(1) {
            let bytes = comm.recv(peer, COUNT_TAG)?;
            *count = read_u32_le(&mut bytes.as_slice())? as usize;
        }
    } else {
        let mut buf = Vec::with_capacity(4);
        write_u32_le(&mut buf, local.len() as u32);
        comm.send(0, COUNT_TAG, buf)?;
    }
    comm.barrier()?;

    let gathered = if rank == 0 {
        let mut lists = Vec::with_capacity(size);
        lists.push(local.to_vec());
        for (peer, &expected) in counts.iter().enumerate().skip(1) {
            if expected == 0 {
                lists.push(Vec::new());
                continue;
            }
            let bytes = comm.recv(peer, RECORDS_TAG)?;
            let list = decode_nuclei(&bytes, dim, peer)?;
            if list.len() != expected {
                return Err(CommError::PayloadMismatch {
                    peer,
                    expected,
                    actual: list.len(),
                }
                .into());
            }
            lists.push(list);
        }
        debug!(
            partitions = size,
            candidates = counts.iter().sum::<usize>(),
            "gathered nucleation candidates"
        );
        Some(lists)
    } else {
        if !local.is_empty() {
            comm.send(0, RECORDS_TAG, encode_nuclei(local, dim))?;
        }
        None
    };
    comm.barrier()?;
    Ok(gathered)
}

/// Deduplicate gathered candidates into the canonical list.
///
/// Candidates are ordered by seeded time, then origin point id. A candidate
/// is dropped when any candidate ahead of it in that order lies within
/// `min_separation`, whether or not that one survives itself, so a chain
/// of close candidates keeps only its head. The result depends only on the
/// union of the lists, not on how they are split. Indices are renumbered
/// from zero.
pub fn reconcile(lists: &[Vec<Nucleus>], min_separation: f64) -> Vec<Nucleus> {
    let mut all: Vec<&Nucleus> = lists.iter().flatten().collect();
    all.sort_by(|a, b| a.precedence(b));

    let mut canonical: Vec<Nucleus> = all
        .iter()
        .enumerate()
        .filter(|(i, candidate)| {
            !candidate.conflicts_with(all[..*i].iter().copied(), min_separation)
        })
        .map(|(_, candidate)| (*candidate).clone())
        .collect();
    reindex(&mut canonical);
    canonical
}
