//! Field descriptors and the [`FieldSet`] bitmask.

use crate::id::FieldId;

/// Storage arity of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// One value per mesh point.
    Scalar,
    /// One value per spatial axis per mesh point (e.g. displacement).
    Vector,
}

impl FieldType {
    /// Number of storage slots per mesh point in a `dim`-dimensional mesh.
    pub fn components(&self, dim: usize) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector => dim,
        }
    }

    /// Whether this is a scalar field.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar)
    }
}

/// PDE character of a field's governing equation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PdeKind {
    /// Time-evolved (Cahn-Hilliard, Allen-Cahn).
    Parabolic,
    /// Static constraint solved every step (mechanical equilibrium).
    Elliptic,
}

/// Definition of a field registered in a simulation session.
///
/// Registered once at setup and immutable thereafter; `FieldId` is the
/// index into the roster.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    /// Name used by requirement tables and diagnostics.
    pub name: String,
    /// Scalar or vector storage.
    pub field_type: FieldType,
    /// Parabolic or elliptic.
    pub pde: PdeKind,
}

impl FieldDef {
    /// A scalar field.
    pub fn scalar(name: impl Into<String>, pde: PdeKind) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Scalar,
            pde,
        }
    }

    /// A vector field with one component per spatial axis.
    pub fn vector(name: impl Into<String>, pde: PdeKind) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::Vector,
            pde,
        }
    }
}

/// A set of field IDs packed into a single 64-bit mask.
///
/// Rosters are small (a composition, a handful of order parameters and a
/// displacement), so the mask caps the roster at [`FieldSet::CAPACITY`]
/// fields; session validation rejects larger rosters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldSet {
    bits: u64,
}

impl FieldSet {
    /// Largest field index + 1 that fits in the mask.
    pub const CAPACITY: usize = 64;

    /// Create an empty field set.
    pub fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Insert a field ID. Returns `false` if the ID exceeds the capacity.
    pub fn insert(&mut self, field: FieldId) -> bool {
        if field.index() >= Self::CAPACITY {
            return false;
        }
        self.bits |= 1u64 << field.0;
        true
    }

    /// Check whether a field ID is in the set.
    pub fn contains(&self, field: FieldId) -> bool {
        field.index() < Self::CAPACITY && self.bits & (1u64 << field.0) != 0
    }

    /// Fields in either set.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Fields in `self` but not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        Self {
            bits: self.bits & !other.bits,
        }
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Number of fields in the set.
    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Iterate over the IDs in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = FieldId> + '_ {
        let bits = self.bits;
        (0..Self::CAPACITY as u32)
            .filter(move |i| bits & (1u64 << i) != 0)
            .map(FieldId)
    }
}

impl FromIterator<FieldId> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldId>>(iter: I) -> Self {
        let mut set = Self::empty();
        for field in iter {
            set.insert(field);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_field_set() -> impl Strategy<Value = FieldSet> {
        prop::collection::vec(0u32..64, 0..16)
            .prop_map(|ids| ids.into_iter().map(FieldId).collect::<FieldSet>())
    }

    #[test]
    fn vector_components_follow_dimension() {
        assert_eq!(FieldType::Vector.components(2), 2);
        assert_eq!(FieldType::Vector.components(3), 3);
        assert_eq!(FieldType::Scalar.components(3), 1);
    }

    #[test]
    fn insert_beyond_capacity_is_rejected() {
        let mut set = FieldSet::empty();
        assert!(!set.insert(FieldId(64)));
        assert!(set.is_empty());
        assert!(!set.contains(FieldId(64)));
    }

    proptest! {
        #[test]
        fn iter_is_ascending_and_complete(a in arb_field_set()) {
            let ids: Vec<FieldId> = a.iter().collect();
            prop_assert_eq!(ids.len(), a.len());
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(ids.iter().all(|id| a.contains(*id)));
        }

        #[test]
        fn difference_removes_common(a in arb_field_set(), b in arb_field_set()) {
            let diff = a.difference(&b);
            for field in diff.iter() {
                prop_assert!(a.contains(field));
                prop_assert!(!b.contains(field));
            }
            prop_assert_eq!(diff.union(&b), a.union(&b));
        }
    }
}
