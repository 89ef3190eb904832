//! Error types for the nucleation subsystem.

use seedbed_comm::CommError;
use seedbed_core::{FieldError, FieldId};

use std::error::Error;
use std::fmt;

/// Errors raised by a nucleation step. All are fatal to the run.
#[derive(Clone, Debug, PartialEq)]
pub enum NucleationError {
    /// A collective operation failed or returned a malformed payload.
    Comm(CommError),
    /// A field read or write failed.
    Field(FieldError),
    /// A field the subsystem reads or writes is not scalar.
    NotScalar {
        /// The offending field.
        field: FieldId,
    },
    /// A nucleus has a different dimension than the mesh.
    DimensionMismatch {
        /// Mesh dimension.
        expected: usize,
        /// Nucleus dimension.
        actual: usize,
    },
}

impl fmt::Display for NucleationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comm(e) => write!(f, "communication: {e}"),
            Self::Field(e) => write!(f, "field: {e}"),
            Self::NotScalar { field } => write!(f, "field {field} is not scalar"),
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "nucleus has dimension {actual}, mesh has {expected}")
            }
        }
    }
}

impl Error for NucleationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Comm(e) => Some(e),
            Self::Field(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CommError> for NucleationError {
    fn from(e: CommError) -> Self {
        Self::Comm(e)
    }
}

impl From<FieldError> for NucleationError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}
