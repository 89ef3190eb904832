//! The [`Nucleus`] record.

use seedbed_core::{distance, Point};

/// A proposed or canonical seed of the precipitate phase.
///
/// `index` is a position in the list the nucleus currently lives in and is
/// reassigned on every reconciliation pass. `origin` is the global id of the
/// mesh point that proposed it; it breaks ties between equal seed times.
#[derive(Clone, Debug, PartialEq)]
pub struct Nucleus {
    /// Position in the owning list.
    pub index: usize,
    /// Physical center.
    pub center: Point,
    /// Radius of the imposed profile.
    pub radius: f64,
    /// Time from which the nucleus may be applied.
    pub seeded_time: f64,
    /// Length of the window during which it is applied.
    pub seeding_time: f64,
    /// Global id of the proposing mesh point.
    pub origin: u64,
}

impl Nucleus {
    /// Whether the nucleus is applied at time `t`:
    /// `seeded_time < t < seeded_time + seeding_time`.
    pub fn is_active(&self, t: f64) -> bool {
        t > self.seeded_time && t < self.seeded_time + self.seeding_time
    }

    /// Center-to-center distance.
    pub fn distance_to(&self, other: &Nucleus) -> f64 {
        distance(&self.center, &other.center)
    }

    /// Whether `self` lies within `min_separation` of any of `others`.
    pub fn conflicts_with<'a>(
        &self,
        others: impl IntoIterator<Item = &'a Nucleus>,
        min_separation: f64,
    ) -> bool {
        others
            .into_iter()
            .any(|o| self.distance_to(o) <= min_separation)
    }

    /// Deterministic precedence: earlier seeded time first, then lower
    /// origin point.
    pub(crate) fn precedence(&self, other: &Nucleus) -> std::cmp::Ordering {
        self.seeded_time
            .total_cmp(&other.seeded_time)
            .then(self.origin.cmp(&other.origin))
    }
}

/// Renumber `nuclei` as `0..len`.
pub fn reindex(nuclei: &mut [Nucleus]) {
    for (i, n) in nuclei.iter_mut().enumerate() {
        n.index = i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn at(x: f64, seeded: f64, origin: u64) -> Nucleus {
        Nucleus {
            index: 0,
            center: smallvec![x, 0.0],
            radius: 1.0,
            seeded_time: seeded,
            seeding_time: 2.0,
            origin,
        }
    }

    #[test]
    fn active_window_is_open_on_both_ends() {
        let n = at(0.0, 1.0, 0);
        assert!(!n.is_active(1.0));
        assert!(n.is_active(1.5));
        assert!(n.is_active(2.999));
        assert!(!n.is_active(3.0));
        assert!(!n.is_active(0.5));
    }

    #[test]
    fn conflicts_at_exact_separation() {
        let a = at(0.0, 0.0, 0);
        let b = at(2.0, 0.0, 1);
        assert!(a.conflicts_with([&b], 2.0));
        assert!(!a.conflicts_with([&b], 1.999));
    }

    #[test]
    fn precedence_orders_by_time_then_origin() {
        use std::cmp::Ordering;
        assert_eq!(at(0.0, 1.0, 9).precedence(&at(0.0, 2.0, 0)), Ordering::Less);
        assert_eq!(at(0.0, 1.0, 3).precedence(&at(0.0, 1.0, 4)), Ordering::Less);
    }

    #[test]
    fn reindex_is_positional() {
        let mut v = vec![at(0.0, 0.0, 5), at(1.0, 0.0, 7)];
        v[0].index = 42;
        reindex(&mut v);
        assert_eq!(v[0].index, 0);
        assert_eq!(v[1].index, 1);
    }
}
