//! Error types for assembly passes.

use seedbed_core::{FieldError, FieldId};
use seedbed_mesh::MeshError;

use std::error::Error;
use std::fmt;

/// Errors raised while assembling residuals or operator actions.
#[derive(Clone, Debug, PartialEq)]
pub enum AssemblyError {
    /// The mesh collaborator rejected an evaluation or scatter.
    Mesh(MeshError),
    /// A field buffer could not be accessed.
    Field(FieldError),
    /// The field state does not match the registry's roster.
    RosterMismatch {
        /// Fields in the registry.
        expected: usize,
        /// Fields in the supplied state.
        actual: usize,
    },
    /// The operator target does not take part in the operator pass.
    TargetNotInLhs {
        /// The requested target.
        field: FieldId,
    },
    /// A trial or destination vector has the wrong length.
    VectorLength {
        /// Which vector.
        what: &'static str,
        /// Required length.
        expected: usize,
        /// Supplied length.
        actual: usize,
    },
    /// The kernel defines no energy density.
    NoEnergyModel {
        /// Kernel name.
        kernel: String,
    },
    /// The operation needs a scalar field.
    NotScalar {
        /// The offending field.
        field: FieldId,
    },
    /// An energy worker thread panicked.
    WorkerPanicked,
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mesh(e) => write!(f, "mesh: {e}"),
            Self::Field(e) => write!(f, "field: {e}"),
            Self::RosterMismatch { expected, actual } => {
                write!(f, "state has {actual} fields, registry has {expected}")
            }
            Self::TargetNotInLhs { field } => {
                write!(f, "field {field} does not take part in the operator pass")
            }
            Self::VectorLength {
                what,
                expected,
                actual,
            } => write!(f, "{what} has length {actual}, expected {expected}"),
            Self::NoEnergyModel { kernel } => {
                write!(f, "kernel '{kernel}' defines no energy density")
            }
            Self::NotScalar { field } => write!(f, "field {field} is not scalar"),
            Self::WorkerPanicked => write!(f, "energy worker thread panicked"),
        }
    }
}

impl Error for AssemblyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Mesh(e) => Some(e),
            Self::Field(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MeshError> for AssemblyError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}

impl From<FieldError> for AssemblyError {
    fn from(e: FieldError) -> Self {
        Self::Field(e)
    }
}
