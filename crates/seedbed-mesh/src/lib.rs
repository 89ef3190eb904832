//! Mesh and finite-element evaluation for seedbed simulations.
//!
//! This crate defines the [`Mesh`] trait, the collaborator through which
//! the assembler iterates local cells, evaluates fields at quadrature
//! points and scatter-adds residuals, and through which nucleation maps
//! mesh points to locally-owned degrees of freedom.
//!
//! # Backends
//!
//! - [`StructuredGrid`]: axis-aligned tensor-product grid with bilinear
//!   (Q1) elements and 2-point Gauss quadrature per axis, partitioned into
//!   contiguous cell ranges by rank.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod grid;
pub mod mesh;
mod shape;
pub mod values;

#[cfg(test)]
pub(crate) mod compliance;

pub use error::MeshError;
pub use grid::StructuredGrid;
pub use mesh::{Mesh, SupportPoint};
pub use values::{CellResidual, CellValues};
