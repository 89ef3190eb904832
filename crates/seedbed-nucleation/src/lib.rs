//! Distributed stochastic nucleation.
//!
//! Each step runs four stages, all collective across partitions:
//!
//! 1. [`detect`]: every partition proposes candidates on the mesh points
//!    it owns and drops those too close to its own earlier candidates.
//! 2. [`gather_candidates`] + [`reconcile`]: rank 0 collects every list
//!    and keeps a minimum-separation subset, earliest seeded first.
//! 3. [`broadcast_nuclei`]: rank 0 sends the canonical list to everyone.
//! 4. [`seed_nuclei`]: every partition overwrites the seeded order
//!    parameter around active nuclei on its owned points.
//!
//! [`advance`] chains the four. State that outlives a step lives in the
//! caller-owned [`NucleationState`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod advance;
pub mod config;
pub mod detect;
pub mod draws;
pub mod error;
pub mod nucleus;
pub mod reconcile;
pub mod seed;
pub mod state;
pub mod wire;

pub use advance::{advance, NucleationReport};
pub use config::{
    LocalHistory, NucleationConfig, NucleationConfigBuilder, ProbabilityModel, SeedProfile,
    SeedTiming,
};
pub use detect::{detect, detect_against, probability_at};
pub use draws::{ChaChaDraws, UniformDraws};
pub use error::NucleationError;
pub use nucleus::Nucleus;
pub use reconcile::{gather_candidates, reconcile};
pub use seed::{broadcast_nuclei, seed_nuclei};
pub use state::NucleationState;
