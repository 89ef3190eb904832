//! Caller-owned nucleation state carried between steps.

use crate::nucleus::{reindex, Nucleus};

/// This partition's retained candidates.
///
/// Under [`LocalHistory::Retain`](crate::LocalHistory::Retain) every
/// candidate a partition has accepted stays here and is re-reconciled each
/// step. `UntilExpired` drops candidates whose window has closed and
/// `PerStep` clears the list before detection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NucleationState {
    local: Vec<Nucleus>,
}

impl NucleationState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retained local candidates, in acceptance order.
    pub fn local(&self) -> &[Nucleus] {
        &self.local
    }

    /// Drop every retained candidate.
    pub fn clear(&mut self) {
        self.local.clear();
    }

    /// Drop candidates whose seeding window has closed by `time`.
    /// Returns how many were removed.
    pub fn drop_expired(&mut self, time: f64) -> usize {
        let before = self.local.len();
        self.local.retain(|n| time < n.seeded_time + n.seeding_time);
        reindex(&mut self.local);
        before - self.local.len()
    }

    pub(crate) fn extend(&mut self, found: Vec<Nucleus>) {
        self.local.extend(found);
        reindex(&mut self.local);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn window(seeded: f64, seeding: f64, origin: u64) -> Nucleus {
        Nucleus {
            index: 0,
            center: smallvec![origin as f64],
            radius: 0.5,
            seeded_time: seeded,
            seeding_time: seeding,
            origin,
        }
    }

    #[test]
    fn extend_reindexes_in_acceptance_order() {
        let mut s = NucleationState::new();
        s.extend(vec![window(0.0, 1.0, 4)]);
        s.extend(vec![window(0.5, 1.0, 2)]);
        let idx: Vec<(usize, u64)> = s.local().iter().map(|n| (n.index, n.origin)).collect();
        assert_eq!(idx, [(0, 4), (1, 2)]);
    }

    #[test]
    fn expired_windows_are_dropped() {
        let mut s = NucleationState::new();
        s.extend(vec![window(0.0, 1.0, 0), window(0.5, 1.0, 1), window(1.0, 5.0, 2)]);
        assert_eq!(s.drop_expired(0.9), 0);
        // a window closing exactly now counts as expired
        assert_eq!(s.drop_expired(1.0), 1);
        let left: Vec<(usize, u64)> = s.local().iter().map(|n| (n.index, n.origin)).collect();
        assert_eq!(left, [(0, 1), (1, 2)]);
        assert_eq!(s.drop_expired(10.0), 2);
        assert!(s.local().is_empty());
    }
}
