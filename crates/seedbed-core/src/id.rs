//! Strongly-typed identifiers and the [`Point`] type alias.

use smallvec::SmallVec;
use std::fmt;

/// Largest spatial dimension supported by the framework.
pub const MAX_DIM: usize = 3;

/// Identifies a field within a simulation session.
///
/// Fields are registered once at setup and assigned sequential IDs.
/// `FieldId(n)` corresponds to the n-th entry of the field roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(pub u32);

impl FieldId {
    /// Position of this field in the roster.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FieldId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Physical coordinates of a mesh point or nucleus center.
///
/// Inline storage covers up to [`MAX_DIM`] axes; the length equals the
/// spatial dimension of the mesh.
pub type Point = SmallVec<[f64; MAX_DIM]>;

/// Euclidean distance between two points of equal dimension.
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(distance(&[1.5], &[1.5]), 0.0);
    }

    #[test]
    fn field_id_display_and_index() {
        let id = FieldId::from(7);
        assert_eq!(id.to_string(), "7");
        assert_eq!(id.index(), 7);
    }
}
