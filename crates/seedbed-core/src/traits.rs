//! Field access traits.

use crate::error::FieldError;
use crate::id::FieldId;

/// Read-only access to field data on one partition.
///
/// Returns `None` if the field is not readable in the current context.
pub trait FieldReader {
    /// Read the data for a field as a flat f64 slice.
    ///
    /// Vector fields are interleaved: component `c` of point `p` lives at
    /// `p * dim + c`.
    fn read(&self, field: FieldId) -> Option<&[f64]>;

    /// Read one degree of freedom.
    fn read_dof(&self, field: FieldId, dof: usize) -> Result<f64, FieldError> {
        let data = self.read(field).ok_or(FieldError::UnknownField { field })?;
        data.get(dof).copied().ok_or(FieldError::DofOutOfRange {
            field,
            dof,
            len: data.len(),
        })
    }
}

/// Mutable access to field data on one partition.
pub trait FieldWriter {
    /// Get a mutable slice for writing field data.
    ///
    /// Returns `None` if the field ID is invalid or not writable.
    fn write(&mut self, field: FieldId) -> Option<&mut [f64]>;

    /// Overwrite one degree of freedom.
    fn write_dof(&mut self, field: FieldId, dof: usize, value: f64) -> Result<(), FieldError> {
        let data = self
            .write(field)
            .ok_or(FieldError::UnknownField { field })?;
        let len = data.len();
        let slot = data
            .get_mut(dof)
            .ok_or(FieldError::DofOutOfRange { field, dof, len })?;
        *slot = value;
        Ok(())
    }
}
