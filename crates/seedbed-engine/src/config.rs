//! Session configuration, validation, and error types.
//!
//! [`SessionConfig`] is the input for constructing a [`Session`](crate::Session).
//! [`validate()`](SessionConfig::validate) checks structural invariants
//! before the run starts; the session constructor calls it first.

use std::error::Error;
use std::fmt;

use seedbed_assembly::{RegistryError, RequirementTable, ResidualKernel, VariableRegistry};
use seedbed_comm::Communicator;
use seedbed_core::{FieldDef, FieldType};
use seedbed_mesh::Mesh;
use seedbed_models::{CoupledChAcMechanics, MaterialModel, MaterialModelBuilder};
use seedbed_nucleation::{NucleationConfig, NucleationConfigBuilder, UniformDraws};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected before a run starts.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The variable registry could not be built or does not fit the kernel.
    Registry(RegistryError),
    /// A material-model builder rejected its constants.
    InvalidModel {
        /// Builder diagnostic.
        reason: String,
    },
    /// The nucleation configuration is unusable with this roster.
    InvalidNucleation {
        /// Description of the problem.
        reason: String,
    },
    /// The mesh has no cells.
    EmptyMesh,
    /// No fields registered.
    NoFields,
    /// Mesh and model disagree on the spatial dimension.
    DimensionMismatch {
        /// Mesh dimension.
        mesh: usize,
        /// Model dimension.
        model: usize,
    },
    /// The energy threshold is NaN, infinite or negative.
    InvalidEnergyThreshold {
        /// The invalid value.
        value: f64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(e) => write!(f, "registry: {e}"),
            Self::InvalidModel { reason } => write!(f, "invalid material model: {reason}"),
            Self::InvalidNucleation { reason } => {
                write!(f, "invalid nucleation config: {reason}")
            }
            Self::EmptyMesh => write!(f, "mesh has zero cells"),
            Self::NoFields => write!(f, "no fields registered"),
            Self::DimensionMismatch { mesh, model } => {
                write!(f, "mesh is {mesh}-dimensional, model is {model}-dimensional")
            }
            Self::InvalidEnergyThreshold { value } => {
                write!(f, "energy_threshold must be finite and >= 0, got {value}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Registry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RegistryError> for ConfigError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

// ── SessionConfig ──────────────────────────────────────────────────

/// Complete configuration for one partition's session.
pub struct SessionConfig {
    /// This partition's view of the mesh.
    pub mesh: Box<dyn Mesh>,
    /// This partition's communicator endpoint.
    pub comm: Box<dyn Communicator>,
    /// Per-point physics.
    pub kernel: Box<dyn ResidualKernel>,
    /// Field roster. `FieldId(n)` corresponds to `fields[n]`.
    pub fields: Vec<FieldDef>,
    /// Per-field evaluation needs and residual outputs, keyed by name.
    pub requirements: RequirementTable,
    /// Nucleation policy, if nucleation is enabled.
    pub nucleation: Option<NucleationConfig>,
    /// Draw source for nucleation. `None` = ChaCha keyed by the
    /// nucleation seed.
    pub draws: Option<Box<dyn UniformDraws>>,
    /// Threads used for energy evaluation. Default: 1.
    pub energy_workers: usize,
    /// Tracked-field value at or below which energy is ignored.
    /// Default: `1e-10`.
    pub energy_threshold: f64,
}

impl SessionConfig {
    /// Configuration with the kernel's own roster and the given
    /// requirement table; no nucleation.
    pub fn new(
        mesh: Box<dyn Mesh>,
        comm: Box<dyn Communicator>,
        kernel: Box<dyn ResidualKernel>,
        requirements: RequirementTable,
    ) -> Self {
        Self {
            fields: kernel.fields(),
            mesh,
            comm,
            kernel,
            requirements,
            nucleation: None,
            draws: None,
            energy_workers: 1,
            energy_threshold: seedbed_assembly::EnergyAccumulator::DEFAULT_THRESHOLD,
        }
    }

    /// Configuration for the coupled phase-field model.
    pub fn coupled(
        mesh: Box<dyn Mesh>,
        comm: Box<dyn Communicator>,
        model: MaterialModel,
    ) -> Result<Self, ConfigError> {
        if model.dim != mesh.dim() {
            return Err(ConfigError::DimensionMismatch {
                mesh: mesh.dim(),
                model: model.dim,
            });
        }
        let kernel = CoupledChAcMechanics::new(model);
        let requirements = kernel.requirements();
        Ok(Self::new(mesh, comm, Box::new(kernel), requirements))
    }

    /// [`coupled`](Self::coupled) from an unbuilt material model.
    pub fn coupled_from_builder(
        mesh: Box<dyn Mesh>,
        comm: Box<dyn Communicator>,
        builder: MaterialModelBuilder,
    ) -> Result<Self, ConfigError> {
        let model = builder
            .build()
            .map_err(|reason| ConfigError::InvalidModel { reason })?;
        Self::coupled(mesh, comm, model)
    }

    /// Enable nucleation.
    pub fn with_nucleation(mut self, config: NucleationConfig) -> Self {
        self.nucleation = Some(config);
        self
    }

    /// Enable nucleation from an unbuilt configuration.
    pub fn with_nucleation_builder(
        self,
        builder: NucleationConfigBuilder,
    ) -> Result<Self, ConfigError> {
        let config = builder
            .build()
            .map_err(|reason| ConfigError::InvalidNucleation { reason })?;
        Ok(self.with_nucleation(config))
    }

    /// Replace the nucleation draw source.
    pub fn with_draws(mut self, draws: Box<dyn UniformDraws>) -> Self {
        self.draws = Some(draws);
        self
    }

    /// Set the energy worker count.
    pub fn with_energy_workers(mut self, workers: usize) -> Self {
        self.energy_workers = workers;
        self
    }

    /// Validate all structural invariants.
    ///
    /// Returns the registry built along the way so the session does not
    /// build it twice.
    pub fn validate(&self) -> Result<VariableRegistry, ConfigError> {
        // 1. Mesh must have at least one cell.
        if self.mesh.n_cells() == 0 {
            return Err(ConfigError::EmptyMesh);
        }
        // 2. Must have at least one field.
        if self.fields.is_empty() {
            return Err(ConfigError::NoFields);
        }
        // 3. Registry over the roster, checked against the kernel.
        let registry = VariableRegistry::build(&self.fields, &self.requirements, self.mesh.dim())?;
        registry.check_kernel(&*self.kernel)?;
        // 4. Energy threshold.
        if !self.energy_threshold.is_finite() || self.energy_threshold < 0.0 {
            return Err(ConfigError::InvalidEnergyThreshold {
                value: self.energy_threshold,
            });
        }
        // 5. Nucleation fields must be scalar fields of the roster.
        if let Some(n) = &self.nucleation {
            for field in n.fields() {
                match self.fields.get(field.index()) {
                    None => {
                        return Err(ConfigError::InvalidNucleation {
                            reason: format!("field {field} is not in the roster"),
                        })
                    }
                    Some(def) if def.field_type != FieldType::Scalar => {
                        return Err(ConfigError::InvalidNucleation {
                            reason: format!("field '{}' is not scalar", def.name),
                        })
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedbed_comm::SerialComm;
    use seedbed_core::FieldId;
    use seedbed_mesh::StructuredGrid;
    use seedbed_models::OrderParameter;
    use seedbed_nucleation::{ProbabilityModel, SeedTiming};

    fn grid(dim: usize) -> Box<dyn Mesh> {
        let cells = vec![2; dim];
        let extent = vec![1.0; dim];
        Box::new(StructuredGrid::new(&cells, &extent).unwrap())
    }

    fn model(dim: usize) -> MaterialModelBuilder {
        MaterialModel::builder(dim)
            .matrix_energy(vec![0.0, 0.0, 1.0])
            .precipitate_energy(vec![1.0, -2.0, 1.0])
            .order_parameter(OrderParameter::isotropic("n1", 0.1))
            .mobilities(1.0, 1.0)
            .dt(0.01)
    }

    fn nucleation() -> NucleationConfigBuilder {
        NucleationConfig::builder()
            .composition(FieldId(0))
            .order_parameter(FieldId(1))
            .model(ProbabilityModel::Exponential {
                k1: 1.0,
                k2: 0.1,
                c0: 0.3,
            })
            .radius(0.2)
            .timing(SeedTiming::AtDetection { window: 1.0 })
    }

    #[test]
    fn coupled_config_validates() {
        let cfg =
            SessionConfig::coupled_from_builder(grid(2), Box::new(SerialComm::new()), model(2))
                .unwrap()
                .with_nucleation_builder(nucleation())
                .unwrap();
        let registry = cfg.validate().unwrap();
        assert_eq!(registry.field_count(), 2);
    }

    #[test]
    fn missing_model_constant_is_a_config_error() {
        let err = SessionConfig::coupled_from_builder(
            grid(2),
            Box::new(SerialComm::new()),
            MaterialModel::builder(2).dt(0.1),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidModel { .. }));
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let err = SessionConfig::coupled_from_builder(grid(3), Box::new(SerialComm::new()), model(2))
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::DimensionMismatch { mesh: 3, model: 2 });
    }

    #[test]
    fn nucleation_fields_must_exist_and_be_scalar() {
        let base = || {
            SessionConfig::coupled_from_builder(grid(2), Box::new(SerialComm::new()), model(2))
                .unwrap()
        };
        let cfg = base()
            .with_nucleation_builder(nucleation().seeded_field(FieldId(9)))
            .unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidNucleation { .. })
        ));

        let err = base()
            .with_nucleation_builder(nucleation().radius(-1.0))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidNucleation { .. }));
    }

    #[test]
    fn bad_energy_threshold_rejected() {
        let mut cfg =
            SessionConfig::coupled_from_builder(grid(2), Box::new(SerialComm::new()), model(2))
                .unwrap();
        cfg.energy_threshold = f64::NAN;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidEnergyThreshold { .. })
        ));
    }

    #[test]
    fn hessian_request_rejected_for_coupled_kernel() {
        let mut cfg =
            SessionConfig::coupled_from_builder(grid(2), Box::new(SerialComm::new()), model(2))
                .unwrap();
        cfg.requirements
            .get_mut("c")
            .unwrap()
            .rhs
            .hessian = true;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Registry(RegistryError::UnsupportedDerivative { .. }))
        ));
    }
}
