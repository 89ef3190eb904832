//! Simulation session for seedbed.
//!
//! A [`SessionConfig`] bundles one partition's mesh, communicator, kernel,
//! requirement table and optional nucleation policy. [`Session::new`]
//! validates it and exposes the collective operations a time-stepping
//! driver calls: [`assemble_rhs`](Session::assemble_rhs),
//! [`apply_lhs_operator`](Session::apply_lhs_operator),
//! [`advance_nucleation`](Session::advance_nucleation),
//! [`compute_energy`](Session::compute_energy) and
//! [`integrate_field`](Session::integrate_field).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod session;

pub use config::{ConfigError, SessionConfig};
pub use error::{SessionError, Stage};
pub use session::Session;
