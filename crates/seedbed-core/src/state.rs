//! The per-partition solution store.

use crate::error::FieldError;
use crate::field::{FieldDef, FieldType};
use crate::id::FieldId;
use crate::traits::{FieldReader, FieldWriter};

/// Solution vectors for every field of the roster on one partition.
///
/// Each field owns one flat buffer of `n_points * components` slots,
/// indexed by global mesh point. Slots for points the partition does not
/// own hold ghost copies that the owner keeps authoritative.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldState {
    dim: usize,
    n_points: usize,
    types: Vec<FieldType>,
    buffers: Vec<Vec<f64>>,
}

impl FieldState {
    /// Zero-initialised storage for `fields` over `n_points` mesh points.
    pub fn zeros(fields: &[FieldDef], n_points: usize, dim: usize) -> Self {
        let types: Vec<FieldType> = fields.iter().map(|f| f.field_type).collect();
        let buffers = types
            .iter()
            .map(|t| vec![0.0; n_points * t.components(dim)])
            .collect();
        Self {
            dim,
            n_points,
            types,
            buffers,
        }
    }

    /// Zeroed storage with the same layout as `self`.
    pub fn zeros_like(&self) -> Self {
        Self {
            dim: self.dim,
            n_points: self.n_points,
            types: self.types.clone(),
            buffers: self.buffers.iter().map(|b| vec![0.0; b.len()]).collect(),
        }
    }

    /// Number of fields.
    pub fn field_count(&self) -> usize {
        self.buffers.len()
    }

    /// Number of mesh points.
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Spatial dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Storage arity of a field.
    pub fn field_type(&self, field: FieldId) -> Option<FieldType> {
        self.types.get(field.index()).copied()
    }

    /// Borrow a field's buffer.
    pub fn field(&self, field: FieldId) -> Result<&[f64], FieldError> {
        self.read(field).ok_or(FieldError::UnknownField { field })
    }

    /// Mutably borrow a field's buffer.
    pub fn field_mut(&mut self, field: FieldId) -> Result<&mut [f64], FieldError> {
        self.write(field).ok_or(FieldError::UnknownField { field })
    }

    /// Replace a field's buffer wholesale.
    pub fn set_field(&mut self, field: FieldId, data: &[f64]) -> Result<(), FieldError> {
        let buf = self.field_mut(field)?;
        if buf.len() != data.len() {
            return Err(FieldError::LengthMismatch {
                field,
                expected: buf.len(),
                actual: data.len(),
            });
        }
        buf.copy_from_slice(data);
        Ok(())
    }

    /// Set every slot of a field to `value`.
    pub fn fill(&mut self, field: FieldId, value: f64) -> Result<(), FieldError> {
        self.field_mut(field)?.fill(value);
        Ok(())
    }

    /// All buffers in roster order.
    pub fn buffers(&self) -> impl Iterator<Item = &[f64]> {
        self.buffers.iter().map(Vec::as_slice)
    }

    /// All buffers in roster order, mutably.
    pub fn buffers_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        self.buffers.iter_mut().map(Vec::as_mut_slice)
    }
}

impl FieldReader for FieldState {
    fn read(&self, field: FieldId) -> Option<&[f64]> {
        self.buffers.get(field.index()).map(Vec::as_slice)
    }
}

impl FieldWriter for FieldState {
    fn write(&mut self, field: FieldId) -> Option<&mut [f64]> {
        self.buffers.get_mut(field.index()).map(Vec::as_mut_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::PdeKind;

    fn roster() -> Vec<FieldDef> {
        vec![
            FieldDef::scalar("c", PdeKind::Parabolic),
            FieldDef::vector("u", PdeKind::Elliptic),
        ]
    }

    #[test]
    fn vector_fields_get_dim_slots_per_point() {
        let state = FieldState::zeros(&roster(), 5, 2);
        assert_eq!(state.field(FieldId(0)).unwrap().len(), 5);
        assert_eq!(state.field(FieldId(1)).unwrap().len(), 10);
    }

    #[test]
    fn dof_access_round_trips_and_checks_bounds() {
        let mut state = FieldState::zeros(&roster(), 3, 1);
        state.write_dof(FieldId(0), 2, 0.75).unwrap();
        assert_eq!(state.read_dof(FieldId(0), 2).unwrap(), 0.75);
        assert_eq!(
            state.read_dof(FieldId(0), 3),
            Err(FieldError::DofOutOfRange {
                field: FieldId(0),
                dof: 3,
                len: 3
            })
        );
        assert_eq!(
            state.write_dof(FieldId(9), 0, 1.0),
            Err(FieldError::UnknownField { field: FieldId(9) })
        );
    }

    #[test]
    fn set_field_rejects_wrong_length() {
        let mut state = FieldState::zeros(&roster(), 3, 2);
        let err = state.set_field(FieldId(1), &[1.0; 3]).unwrap_err();
        assert_eq!(
            err,
            FieldError::LengthMismatch {
                field: FieldId(1),
                expected: 6,
                actual: 3
            }
        );
    }

    #[test]
    fn zeros_like_keeps_layout() {
        let mut state = FieldState::zeros(&roster(), 4, 3);
        state.fill(FieldId(0), 2.0).unwrap();
        let fresh = state.zeros_like();
        assert_eq!(fresh.field(FieldId(1)).unwrap().len(), 12);
        assert!(fresh.field(FieldId(0)).unwrap().iter().all(|v| *v == 0.0));
    }
}
