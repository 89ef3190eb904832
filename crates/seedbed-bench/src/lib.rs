//! Benchmark profiles for the seedbed workspace.
//!
//! - [`reference_profile`]: 64x64 grid (4K cells), elastic two-variant model
//! - [`stress_profile`]: 256x256 grid (~65K cells), same model
//! - [`perturbed_state`]: deterministic composition noise via seed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use seedbed_comm::SerialComm;
use seedbed_core::{FieldId, FieldState};
use seedbed_engine::{Session, SessionConfig};
use seedbed_mesh::StructuredGrid;
use seedbed_models::{Eigenstrain, MaterialModel, OrderParameter, Stiffness};
use seedbed_nucleation::{NucleationConfig, ProbabilityModel, SeedTiming};

/// Two variants with dilatational misfit and heterogeneous stiffness.
pub fn reference_model() -> MaterialModel {
    MaterialModel::builder(2)
        .matrix_energy(vec![0.0, 0.0, 24.7939])
        .precipitate_energy(vec![2.5224, -2.1014, 1.6787])
        .barrier_height(0.1)
        .order_parameter(
            OrderParameter::isotropic("n1", 0.01)
                .with_eigenstrain(Eigenstrain::dilatational(0.0, 0.01)),
        )
        .order_parameter(
            OrderParameter::isotropic("n2", 0.01)
                .with_eigenstrain(Eigenstrain::dilatational(0.0, 0.01)),
        )
        .matrix_stiffness(Stiffness::Isotropic {
            youngs: 2.0,
            poisson: 0.3,
        })
        .precipitate_stiffness(Stiffness::Isotropic {
            youngs: 2.5,
            poisson: 0.3,
        })
        .mobilities(1.0, 100.0)
        .dt(1e-4)
        .build()
        .unwrap()
}

/// Nucleation on the composition with both variants suppressing.
pub fn reference_nucleation(seed: u64) -> NucleationConfig {
    NucleationConfig::builder()
        .composition(FieldId(0))
        .order_parameter(FieldId(1))
        .order_parameter(FieldId(2))
        .model(ProbabilityModel::Exponential {
            k1: 1e-3,
            k2: 1.0,
            c0: 0.03,
        })
        .radius(2.5)
        .timing(SeedTiming::AtDetection { window: 10.0 })
        .seed(seed)
        .build()
        .unwrap()
}

fn profile(cells: usize, seed: u64) -> SessionConfig {
    let extent = cells as f64;
    let mesh = StructuredGrid::new(&[cells, cells], &[extent, extent]).unwrap();
    SessionConfig::coupled(Box::new(mesh), Box::new(SerialComm::new()), reference_model())
        .unwrap()
        .with_nucleation(reference_nucleation(seed))
}

/// Build a reference benchmark profile: 64x64 grid (4K cells).
pub fn reference_profile(seed: u64) -> SessionConfig {
    profile(64, seed)
}

/// Build a stress benchmark profile: 256x256 grid (~65K cells).
pub fn stress_profile(seed: u64) -> SessionConfig {
    profile(256, seed)
}

/// Composition `0.04 ± 0.005` with deterministic noise; everything else zero.
pub fn perturbed_state(session: &Session, seed: u64) -> FieldState {
    let mut state = session.new_state();
    if let Ok(c) = state.field_mut(FieldId(0)) {
        for (i, v) in c.iter_mut().enumerate() {
            let h = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add((i as u64).wrapping_mul(1442695040888963407));
            let unit = (h >> 11) as f64 / (1u64 << 53) as f64;
            *v = 0.04 + 0.01 * (unit - 0.5);
        }
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profile_validates() {
        reference_profile(42).validate().unwrap();
    }

    #[test]
    fn stress_profile_validates() {
        stress_profile(42).validate().unwrap();
    }

    #[test]
    fn perturbed_state_deterministic_and_bounded() {
        let session = Session::new(reference_profile(7)).unwrap();
        let a = perturbed_state(&session, 7);
        let b = perturbed_state(&session, 7);
        assert_eq!(a, b);
        assert!(a
            .field(FieldId(0))
            .unwrap()
            .iter()
            .all(|c| (0.035..=0.045).contains(c)));
    }
}
