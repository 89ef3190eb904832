//! Fatal run errors, tagged with the stage that raised them.

use std::error::Error;
use std::fmt;

use seedbed_assembly::AssemblyError;
use seedbed_comm::CommError;
use seedbed_nucleation::NucleationError;

/// Driver-facing operation in which a failure occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Explicit residual assembly.
    Assembly,
    /// Operator application.
    Operator,
    /// Detect, reconcile, broadcast and seed.
    Nucleation,
    /// Free-energy evaluation.
    Energy,
    /// Field integral.
    Integration,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Assembly => "assembly",
            Self::Operator => "operator",
            Self::Nucleation => "nucleation",
            Self::Energy => "energy",
            Self::Integration => "integration",
        };
        f.write_str(name)
    }
}

/// Errors that end a run. No field state produced after one of these
/// should be treated as final.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionError {
    /// Local assembly failed.
    Assembly {
        /// Which operation.
        stage: Stage,
        /// The assembler's error.
        source: AssemblyError,
    },
    /// The nucleation step failed for a reason other than communication.
    Nucleation(NucleationError),
    /// A collective operation failed. Every rank must abort.
    Communication {
        /// Which operation.
        stage: Stage,
        /// The communicator's error.
        source: CommError,
    },
}

impl SessionError {
    /// The stage the error was raised in.
    pub fn stage(&self) -> Stage {
        match self {
            Self::Assembly { stage, .. } | Self::Communication { stage, .. } => *stage,
            Self::Nucleation(_) => Stage::Nucleation,
        }
    }

    pub(crate) fn assembly(stage: Stage) -> impl FnOnce(AssemblyError) -> Self {
        move |source| Self::Assembly { stage, source }
    }

    pub(crate) fn comm(stage: Stage) -> impl FnOnce(CommError) -> Self {
        move |source| Self::Communication { stage, source }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Assembly { stage, source } => write!(f, "{stage} failed: {source}"),
            Self::Nucleation(e) => write!(f, "nucleation failed: {e}"),
            Self::Communication { stage, source } => {
                write!(f, "communication failed during {stage}: {source}")
            }
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Assembly { source, .. } => Some(source),
            Self::Nucleation(e) => Some(e),
            Self::Communication { source, .. } => Some(source),
        }
    }
}

impl From<NucleationError> for SessionError {
    fn from(e: NucleationError) -> Self {
        match e {
            NucleationError::Comm(source) => Self::Communication {
                stage: Stage::Nucleation,
                source,
            },
            other => Self::Nucleation(other),
        }
    }
}
