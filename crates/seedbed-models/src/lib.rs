//! Phase-field material models and residual kernels.
//!
//! A [`MaterialModel`] gathers every constant a kernel needs: chemical
//! free energies of both phases, the interpolation function, one
//! [`OrderParameter`] per variant with its gradient-energy coefficients
//! and transformation strain, optional elasticity, mobilities and the time
//! step. [`CoupledChAcMechanics`] turns it into a
//! [`ResidualKernel`](seedbed_assembly::ResidualKernel) over a runtime
//! roster `c, n1..nk[, u]`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod coupled;
pub mod elasticity;
pub mod material;

pub use coupled::CoupledChAcMechanics;
pub use elasticity::{Stiffness, VoigtMatrix};
pub use material::{
    Eigenstrain, ElasticModel, Interpolation, MaterialModel, MaterialModelBuilder,
    OrderParameter, Polynomial,
};
