//! Variable registry: per-field evaluation needs and residual outputs.
//!
//! [`VariableRegistry::build`] runs once at setup to turn the roster and
//! the requirement table into two [`VariableInfo`] tables, one for the
//! explicit (RHS) pass over every field and one for the operator (LHS)
//! pass over the fields that take part in it. The LHS table is rebuilt by
//! [`set_lhs_requirements`](VariableRegistry::set_lhs_requirements); the
//! `&mut self` receiver keeps any assembler from reading it meanwhile.

use indexmap::IndexMap;
use seedbed_core::{EvalFlags, FieldDef, FieldId, FieldSet, PdeKind, ResidualFlags};
use tracing::debug;

use crate::kernel::ResidualKernel;

use std::error::Error;
use std::fmt;

// ── Requirements ───────────────────────────────────────────────────

/// What one field needs and produces in each assembly pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VariableRequirements {
    /// Derivatives evaluated for the explicit pass.
    pub rhs: EvalFlags,
    /// Residual slots submitted by the explicit pass.
    pub rhs_residual: ResidualFlags,
    /// Derivatives evaluated for the operator pass. Empty means the field
    /// does not take part in it.
    pub lhs: EvalFlags,
    /// Residual slots submitted when this field is the operator target.
    pub lhs_residual: ResidualFlags,
}

impl VariableRequirements {
    /// Explicit-pass requirements only.
    pub fn explicit(rhs: EvalFlags, rhs_residual: ResidualFlags) -> Self {
        Self {
            rhs,
            rhs_residual,
            ..Self::default()
        }
    }

    /// Add operator-pass requirements.
    pub fn with_lhs(mut self, lhs: EvalFlags, lhs_residual: ResidualFlags) -> Self {
        self.lhs = lhs;
        self.lhs_residual = lhs_residual;
        self
    }

    fn takes_part_in_lhs(&self) -> bool {
        !self.lhs.is_empty() || !self.lhs_residual.is_empty()
    }
}

/// Requirements keyed by field name, in declaration order.
pub type RequirementTable = IndexMap<String, VariableRequirements>;

// ── VariableInfo ───────────────────────────────────────────────────

/// One field's entry in an assembly pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariableInfo {
    /// The field.
    pub field: FieldId,
    /// Position of this entry in its pass's table.
    pub global_var_index: usize,
    /// Offset into the concatenated field vector: scalars take one slot,
    /// vectors take `dim`.
    pub global_field_index: usize,
    /// Scalar or vector storage.
    pub is_scalar: bool,
    /// Index among the pass's scalar entries or among its vector entries.
    pub store_index: usize,
    /// Components per point.
    pub components: usize,
    /// Derivatives evaluated in this pass.
    pub needs: EvalFlags,
    /// Residual slots submitted in this pass.
    pub residual: ResidualFlags,
}

fn build_table<'a>(
    entries: impl Iterator<Item = (FieldId, &'a FieldDef, EvalFlags, ResidualFlags)>,
    dim: usize,
) -> Vec<VariableInfo> {
    let mut offset = 0;
    let mut n_scalar = 0;
    let mut n_vector = 0;
    entries
        .enumerate()
        .map(|(i, (field, def, needs, residual))| {
            let is_scalar = def.field_type.is_scalar();
            let store = if is_scalar { &mut n_scalar } else { &mut n_vector };
            let store_index = *store;
            *store += 1;
            let components = def.field_type.components(dim);
            let info = VariableInfo {
                field,
                global_var_index: i,
                global_field_index: offset,
                is_scalar,
                store_index,
                components,
                needs,
                residual,
            };
            offset += components;
            info
        })
        .collect()
}

// ── RegistryError ──────────────────────────────────────────────────

/// Errors detected while building or validating a registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// The roster is empty.
    EmptyRoster,
    /// Roster exceeds the [`FieldSet`] capacity.
    TooManyFields {
        /// Roster length.
        count: usize,
    },
    /// Two roster entries share a name.
    DuplicateField {
        /// The repeated name.
        name: String,
    },
    /// A requirement names a field that is not in the roster.
    UnknownField {
        /// The unknown name.
        name: String,
    },
    /// The kernel cannot consume a requested derivative.
    UnsupportedDerivative {
        /// Kernel name.
        kernel: String,
        /// Field requesting it.
        field: String,
        /// Which derivative.
        derivative: &'static str,
    },
    /// A field takes part in the operator pass but the kernel has none.
    LhsUnsupported {
        /// Kernel name.
        kernel: String,
        /// Field requesting it.
        field: String,
    },
    /// The roster disagrees with the kernel's roster.
    RosterMismatch {
        /// Kernel name.
        kernel: String,
        /// Description of the first difference.
        reason: String,
    },
    /// An elliptic field asked for a value residual in the explicit pass;
    /// elliptic fields have no time derivative to feed it.
    EllipticValueResidual {
        /// The field.
        field: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRoster => write!(f, "field roster is empty"),
            Self::TooManyFields { count } => write!(
                f,
                "roster has {count} fields, at most {} supported",
                FieldSet::CAPACITY
            ),
            Self::DuplicateField { name } => write!(f, "field '{name}' registered twice"),
            Self::UnknownField { name } => {
                write!(f, "requirement for unknown field '{name}'")
            }
            Self::UnsupportedDerivative {
                kernel,
                field,
                derivative,
            } => write!(
                f,
                "field '{field}' requests {derivative} but kernel '{kernel}' cannot consume it"
            ),
            Self::LhsUnsupported { kernel, field } => write!(
                f,
                "field '{field}' takes part in the operator pass but kernel '{kernel}' has none"
            ),
            Self::RosterMismatch { kernel, reason } => {
                write!(f, "roster does not match kernel '{kernel}': {reason}")
            }
            Self::EllipticValueResidual { field } => write!(
                f,
                "elliptic field '{field}' cannot submit an explicit value residual"
            ),
        }
    }
}

impl Error for RegistryError {}

// ── VariableRegistry ───────────────────────────────────────────────

/// Static description of every field for both assembly passes.
#[derive(Clone, Debug)]
pub struct VariableRegistry {
    dim: usize,
    fields: Vec<FieldDef>,
    names: IndexMap<String, FieldId>,
    requirements: Vec<VariableRequirements>,
    rhs: Vec<VariableInfo>,
    lhs: Vec<VariableInfo>,
}

impl VariableRegistry {
    /// Build the tables for `fields` in a `dim`-dimensional mesh.
    ///
    /// Fields absent from `table` need nothing and produce nothing.
    pub fn build(
        fields: &[FieldDef],
        table: &RequirementTable,
        dim: usize,
    ) -> Result<Self, RegistryError> {
        if fields.is_empty() {
            return Err(RegistryError::EmptyRoster);
        }
        if fields.len() > FieldSet::CAPACITY {
            return Err(RegistryError::TooManyFields {
                count: fields.len(),
            });
        }
        let mut names = IndexMap::with_capacity(fields.len());
        for (i, def) in fields.iter().enumerate() {
            if names
                .insert(def.name.clone(), FieldId(i as u32))
                .is_some()
            {
                return Err(RegistryError::DuplicateField {
                    name: def.name.clone(),
                });
            }
        }
        if let Some(name) = table.keys().find(|k| !names.contains_key(*k)) {
            return Err(RegistryError::UnknownField { name: name.clone() });
        }
        let requirements: Vec<VariableRequirements> = fields
            .iter()
            .map(|def| table.get(&def.name).copied().unwrap_or_default())
            .collect();
        for (def, req) in fields.iter().zip(&requirements) {
            if def.pde == PdeKind::Elliptic && req.rhs_residual.value {
                return Err(RegistryError::EllipticValueResidual {
                    field: def.name.clone(),
                });
            }
        }

        let mut registry = Self {
            dim,
            fields: fields.to_vec(),
            names,
            requirements,
            rhs: Vec::new(),
            lhs: Vec::new(),
        };
        registry.rhs = build_table(
            registry
                .fields
                .iter()
                .zip(&registry.requirements)
                .enumerate()
                .map(|(i, (def, req))| (FieldId(i as u32), def, req.rhs, req.rhs_residual)),
            dim,
        );
        registry.rebuild_lhs();
        Ok(registry)
    }

    fn rebuild_lhs(&mut self) {
        self.lhs = build_table(
            self.fields
                .iter()
                .zip(&self.requirements)
                .enumerate()
                .filter(|(_, (_, req))| req.takes_part_in_lhs())
                .map(|(i, (def, req))| (FieldId(i as u32), def, req.lhs, req.lhs_residual)),
            self.dim,
        );
        debug!(
            lhs_fields = self.lhs.len(),
            total_fields = self.fields.len(),
            "operator table rebuilt"
        );
    }

    /// Change a field's operator-pass requirements and rebuild that table.
    pub fn set_lhs_requirements(
        &mut self,
        field: FieldId,
        lhs: EvalFlags,
        lhs_residual: ResidualFlags,
    ) -> Result<(), RegistryError> {
        let req = self
            .requirements
            .get_mut(field.index())
            .ok_or_else(|| RegistryError::UnknownField {
                name: field.to_string(),
            })?;
        req.lhs = lhs;
        req.lhs_residual = lhs_residual;
        self.rebuild_lhs();
        Ok(())
    }

    /// Check the registry against the kernel that will consume it.
    pub fn check_kernel(&self, kernel: &dyn ResidualKernel) -> Result<(), RegistryError> {
        let name = kernel.name().to_string();
        let expected = kernel.fields();
        if expected.len() != self.fields.len() {
            return Err(RegistryError::RosterMismatch {
                kernel: name,
                reason: format!(
                    "kernel expects {} fields, roster has {}",
                    expected.len(),
                    self.fields.len()
                ),
            });
        }
        for (i, (want, have)) in expected.iter().zip(&self.fields).enumerate() {
            if want != have {
                return Err(RegistryError::RosterMismatch {
                    kernel: name,
                    reason: format!("field {i}: expected {want:?}, found {have:?}"),
                });
            }
        }
        for (def, req) in self.fields.iter().zip(&self.requirements) {
            if (req.rhs.hessian || req.lhs.hessian) && !kernel.supports_hessians() {
                return Err(RegistryError::UnsupportedDerivative {
                    kernel: name,
                    field: def.name.clone(),
                    derivative: "hessian",
                });
            }
            if req.takes_part_in_lhs() && !kernel.supports_lhs() {
                return Err(RegistryError::LhsUnsupported {
                    kernel: name,
                    field: def.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Spatial dimension the offsets were computed for.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of fields in the roster.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// The roster.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.names.get(name).copied()
    }

    /// Requirements of a field.
    pub fn requirements(&self, field: FieldId) -> Option<&VariableRequirements> {
        self.requirements.get(field.index())
    }

    /// Explicit-pass table, one entry per field in roster order.
    pub fn rhs_infos(&self) -> &[VariableInfo] {
        &self.rhs
    }

    /// Operator-pass table, participating fields only.
    pub fn lhs_infos(&self) -> &[VariableInfo] {
        &self.lhs
    }

    /// Fields taking part in the operator pass.
    pub fn lhs_fields(&self) -> FieldSet {
        self.lhs.iter().map(|i| i.field).collect()
    }

    /// Total slots of the concatenated field vector.
    pub fn total_components(&self) -> usize {
        self.rhs.iter().map(|i| i.components).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use seedbed_core::FieldType;

    fn roster() -> Vec<FieldDef> {
        vec![
            FieldDef::scalar("c", PdeKind::Parabolic),
            FieldDef::vector("u", PdeKind::Elliptic),
            FieldDef::scalar("n1", PdeKind::Parabolic),
        ]
    }

    fn table() -> RequirementTable {
        let mut t = RequirementTable::new();
        t.insert(
            "c".into(),
            VariableRequirements::explicit(EvalFlags::VALUE_GRADIENT, ResidualFlags::BOTH),
        );
        t.insert(
            "u".into(),
            VariableRequirements::explicit(EvalFlags::GRADIENT, ResidualFlags::GRADIENT)
                .with_lhs(EvalFlags::GRADIENT, ResidualFlags::GRADIENT),
        );
        t
    }

    #[test]
    fn offsets_are_contiguous_with_vector_width() {
        let reg = VariableRegistry::build(&roster(), &table(), 3).unwrap();
        let offsets: Vec<usize> = reg.rhs_infos().iter().map(|i| i.global_field_index).collect();
        assert_eq!(offsets, vec![0, 1, 4]);
        assert_eq!(reg.total_components(), 5);
        let stores: Vec<(bool, usize)> = reg
            .rhs_infos()
            .iter()
            .map(|i| (i.is_scalar, i.store_index))
            .collect();
        assert_eq!(stores, vec![(true, 0), (false, 0), (true, 1)]);
    }

    #[test]
    fn lhs_table_holds_participants_only() {
        let mut reg = VariableRegistry::build(&roster(), &table(), 2).unwrap();
        assert_eq!(reg.lhs_infos().len(), 1);
        assert_eq!(reg.lhs_infos()[0].field, FieldId(1));
        assert_eq!(reg.lhs_infos()[0].global_field_index, 0);

        reg.set_lhs_requirements(FieldId(2), EvalFlags::VALUE, ResidualFlags::NONE)
            .unwrap();
        let lhs: Vec<FieldId> = reg.lhs_infos().iter().map(|i| i.field).collect();
        assert_eq!(lhs, vec![FieldId(1), FieldId(2)]);
        assert_eq!(reg.lhs_infos()[1].global_field_index, 2);
        assert!(reg.lhs_fields().contains(FieldId(2)));
    }

    #[test]
    fn unknown_and_duplicate_names_are_rejected() {
        let mut t = table();
        t.insert("eta".into(), VariableRequirements::default());
        assert_eq!(
            VariableRegistry::build(&roster(), &t, 2).unwrap_err(),
            RegistryError::UnknownField { name: "eta".into() }
        );
        let mut fields = roster();
        fields.push(FieldDef::scalar("c", PdeKind::Parabolic));
        assert_eq!(
            VariableRegistry::build(&fields, &table(), 2).unwrap_err(),
            RegistryError::DuplicateField { name: "c".into() }
        );
    }

    #[test]
    fn elliptic_value_residual_is_rejected() {
        let mut t = table();
        t.insert(
            "u".into(),
            VariableRequirements::explicit(EvalFlags::VALUE, ResidualFlags::VALUE),
        );
        assert!(matches!(
            VariableRegistry::build(&roster(), &t, 2),
            Err(RegistryError::EllipticValueResidual { .. })
        ));
    }

    #[test]
    fn field_lookup_by_name() {
        let reg = VariableRegistry::build(&roster(), &table(), 2).unwrap();
        assert_eq!(reg.field_id("n1"), Some(FieldId(2)));
        assert_eq!(reg.field_id("missing"), None);
        assert_eq!(reg.requirements(FieldId(2)), Some(&VariableRequirements::default()));
    }

    proptest! {
        #[test]
        fn offsets_partition_the_field_vector(
            kinds in prop::collection::vec(any::<bool>(), 1..12),
            dim in 1usize..=3,
        ) {
            let fields: Vec<FieldDef> = kinds
                .iter()
                .enumerate()
                .map(|(i, vector)| FieldDef {
                    name: format!("f{i}"),
                    field_type: if *vector { FieldType::Vector } else { FieldType::Scalar },
                    pde: PdeKind::Parabolic,
                })
                .collect();
            let reg = VariableRegistry::build(&fields, &RequirementTable::new(), dim).unwrap();
            let mut next = 0;
            for info in reg.rhs_infos() {
                prop_assert_eq!(info.global_field_index, next);
                next += info.components;
            }
            prop_assert_eq!(next, reg.total_components());
        }
    }
}
