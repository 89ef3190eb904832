//! Seedbed: matrix-free phase-field residual assembly with distributed
//! stochastic nucleation.
//!
//! This is the facade crate that re-exports the public API from all
//! seedbed sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use seedbed::prelude::*;
//!
//! let mesh = StructuredGrid::new(&[8, 8], &[1.0, 1.0]).unwrap();
//! let model = MaterialModel::builder(2)
//!     .matrix_energy(vec![0.0, 0.0, 1.0])
//!     .precipitate_energy(vec![1.0, -2.0, 1.0])
//!     .order_parameter(OrderParameter::isotropic("n1", 0.01))
//!     .mobilities(1.0, 1.0)
//!     .dt(1e-3)
//!     .build()
//!     .unwrap();
//! let config =
//!     SessionConfig::coupled(Box::new(mesh), Box::new(SerialComm::new()), model).unwrap();
//! let session = Session::new(config).unwrap();
//!
//! let mut state = session.new_state();
//! state.fill(FieldId(0), 0.5).unwrap();
//! let residual = session.assemble_rhs(&state).unwrap();
//! let energy = session.compute_energy(&state).unwrap();
//! assert!(residual.field(FieldId(0)).unwrap().iter().all(|r| *r > 0.0));
//! assert!((energy.chemical - 0.25).abs() < 1e-12);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `seedbed-core` | IDs, field descriptors, flags, field state |
//! | [`mesh`] | `seedbed-mesh` | Mesh trait and the structured Q1 grid |
//! | [`comm`] | `seedbed-comm` | Communicator trait, serial and channel backends |
//! | [`assembly`] | `seedbed-assembly` | Registry, residual kernels, assembler, energy |
//! | [`models`] | `seedbed-models` | Material model and the coupled kernel |
//! | [`nucleation`] | `seedbed-nucleation` | Detection, reconciliation and seeding |
//! | [`engine`] | `seedbed-engine` | Session configuration and driver operations |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`seedbed-core`).
pub use seedbed_core as types;

/// Meshes (`seedbed-mesh`).
///
/// [`mesh::Mesh`] is the collaborator the assembler and the nucleation
/// subsystem talk to; [`mesh::StructuredGrid`] implements it.
pub use seedbed_mesh as mesh;

/// Collective communication (`seedbed-comm`).
pub use seedbed_comm as comm;

/// Residual assembly (`seedbed-assembly`).
///
/// [`assembly::ResidualKernel`] is the main extension point for
/// user-defined physics.
pub use seedbed_assembly as assembly;

/// Material models (`seedbed-models`).
pub use seedbed_models as models;

/// Distributed nucleation (`seedbed-nucleation`).
pub use seedbed_nucleation as nucleation;

/// Simulation session (`seedbed-engine`).
pub use seedbed_engine as engine;

/// Common imports for typical seedbed usage.
pub mod prelude {
    // Core types and traits
    pub use seedbed_core::{
        EvalFlags, FieldDef, FieldId, FieldReader, FieldState, FieldType, FieldWriter, PdeKind,
        ResidualFlags,
    };

    // Mesh and communication
    pub use seedbed_comm::{ChannelComm, Communicator, SerialComm};
    pub use seedbed_mesh::{Mesh, StructuredGrid};

    // Assembly
    pub use seedbed_assembly::{
        EnergyDensity, EnergyTotals, ModelResidual, ModelVariable, RequirementTable,
        ResidualKernel, VariableRequirements,
    };

    // Models
    pub use seedbed_models::{CoupledChAcMechanics, MaterialModel, OrderParameter, Stiffness};

    // Nucleation
    pub use seedbed_nucleation::{
        LocalHistory, NucleationConfig, NucleationReport, Nucleus, ProbabilityModel, SeedTiming,
    };

    // Engine
    pub use seedbed_engine::{ConfigError, Session, SessionConfig, SessionError};
}
