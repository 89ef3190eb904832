//! Core types and traits for the seedbed phase-field framework.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! field identifiers and descriptors, the derivative/residual flag sets
//! shared by the mesh and the assembler, the per-partition solution
//! store, and the traits used to read and write it.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod field;
pub mod flags;
pub mod id;
pub mod state;
pub mod traits;

pub use error::FieldError;
pub use field::{FieldDef, FieldSet, FieldType, PdeKind};
pub use flags::{EvalFlags, ResidualFlags};
pub use id::{distance, FieldId, Point, MAX_DIM};
pub use state::FieldState;
pub use traits::{FieldReader, FieldWriter};
