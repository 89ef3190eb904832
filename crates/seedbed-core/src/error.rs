//! Error types for field storage access.

use std::error::Error;
use std::fmt;

use crate::id::FieldId;

/// Errors from reading or writing the per-partition solution store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldError {
    /// The field ID is not part of the roster.
    UnknownField {
        /// The offending ID.
        field: FieldId,
    },
    /// A supplied buffer does not match the field's storage size.
    LengthMismatch {
        /// The field the buffer was meant for.
        field: FieldId,
        /// Required number of slots.
        expected: usize,
        /// Number of slots supplied.
        actual: usize,
    },
    /// A degree-of-freedom index lies outside the field's storage.
    DofOutOfRange {
        /// The field being accessed.
        field: FieldId,
        /// The offending index.
        dof: usize,
        /// Storage length of the field.
        len: usize,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { field } => write!(f, "unknown field {field}"),
            Self::LengthMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "field {field}: buffer has {actual} slots, expected {expected}"
            ),
            Self::DofOutOfRange { field, dof, len } => {
                write!(f, "field {field}: dof {dof} out of range [0, {len})")
            }
        }
    }
}

impl Error for FieldError {}
