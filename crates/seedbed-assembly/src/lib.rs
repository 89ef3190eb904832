//! Matrix-free multi-field residual assembly.
//!
//! The [`VariableRegistry`] describes which derivatives each field needs
//! and which residual slots it fills. The [`Assembler`] walks a range of
//! cells, evaluates every field at the quadrature points, hands the
//! per-point [`ModelVariable`] set to a [`ResidualKernel`], and integrates
//! the returned [`ModelResidual`]s into destination vectors. The same
//! loop feeds an [`EnergyAccumulator`] for free-energy bookkeeping.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod assembler;
pub mod energy;
pub mod error;
pub mod kernel;
pub mod registry;
pub mod variable;
mod workspace;

pub use assembler::Assembler;
pub use energy::{EnergyAccumulator, EnergyDensity, EnergyTotals};
pub use error::AssemblyError;
pub use kernel::ResidualKernel;
pub use registry::{
    RegistryError, RequirementTable, VariableInfo, VariableRegistry, VariableRequirements,
};
pub use variable::{ModelResidual, ModelVariable};
