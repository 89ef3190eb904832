//! Reusable residual-kernel fixtures.
//!
//! - [`DiffusionKernel`]: explicit/implicit heat equation on one scalar.
//! - [`ProbeKernel`]: echoes every variable into its residual.
//! - [`UnsolicitedKernel`]: writes every residual slot of every field.

use seedbed_assembly::{
    EnergyDensity, ModelResidual, ModelVariable, RequirementTable, ResidualKernel,
    VariableRequirements,
};
use seedbed_core::{EvalFlags, FieldDef, FieldId, PdeKind, ResidualFlags};

/// `∂u/∂t = D Δu` on a single scalar field `"u"`.
///
/// Explicit residual: value `u`, gradient `−dt·D·∇u`. Operator residual:
/// value `δu`, gradient `dt·D·∇δu`. Energy: `½u²` chemical,
/// `½D|∇u|²` gradient; `u` is the tracked field.
pub struct DiffusionKernel {
    pub dt: f64,
    pub diffusivity: f64,
}

impl DiffusionKernel {
    pub fn new(dt: f64, diffusivity: f64) -> Self {
        Self { dt, diffusivity }
    }

    pub fn requirements() -> RequirementTable {
        let mut t = RequirementTable::new();
        t.insert(
            "u".to_string(),
            VariableRequirements::explicit(EvalFlags::VALUE_GRADIENT, ResidualFlags::BOTH)
                .with_lhs(EvalFlags::VALUE_GRADIENT, ResidualFlags::BOTH),
        );
        t
    }
}

impl ResidualKernel for DiffusionKernel {
    fn name(&self) -> &str {
        "diffusion"
    }

    fn fields(&self) -> Vec<FieldDef> {
        vec![FieldDef::scalar("u", PdeKind::Parabolic)]
    }

    fn supports_lhs(&self) -> bool {
        true
    }

    fn residual_rhs(&self, vars: &[ModelVariable], out: &mut [ModelResidual]) {
        let u = &vars[0];
        out[0].set_scalar(u.scalar());
        for (d, g) in u.scalar_gradient().iter().enumerate() {
            out[0].gradient[0][d] = -self.dt * self.diffusivity * g;
        }
    }

    fn residual_lhs(&self, vars: &[ModelVariable], target: FieldId, out: &mut ModelResidual) {
        let u = &vars[target.index()];
        out.set_scalar(u.scalar());
        for (d, g) in u.scalar_gradient().iter().enumerate() {
            out.gradient[0][d] = self.dt * self.diffusivity * g;
        }
    }

    fn energy_density(&self, vars: &[ModelVariable]) -> Option<EnergyDensity> {
        let u = &vars[0];
        let g2: f64 = u.scalar_gradient().iter().map(|g| g * g).sum();
        Some(EnergyDensity {
            chemical: 0.5 * u.scalar() * u.scalar(),
            gradient: 0.5 * self.diffusivity * g2,
            elastic: 0.0,
        })
    }

    fn energy_tracked_field(&self) -> Option<FieldId> {
        Some(FieldId(0))
    }
}

/// Echoes each variable's value and gradient into its residual, for any
/// roster. The operator residual echoes the target. Accepts hessians.
pub struct ProbeKernel {
    pub fields: Vec<FieldDef>,
}

impl ProbeKernel {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }
}

impl ResidualKernel for ProbeKernel {
    fn name(&self) -> &str {
        "probe"
    }

    fn fields(&self) -> Vec<FieldDef> {
        self.fields.clone()
    }

    fn supports_hessians(&self) -> bool {
        true
    }

    fn supports_lhs(&self) -> bool {
        true
    }

    fn residual_rhs(&self, vars: &[ModelVariable], out: &mut [ModelResidual]) {
        for (v, r) in vars.iter().zip(out.iter_mut()) {
            r.value = v.value;
            r.gradient = v.gradient;
        }
    }

    fn residual_lhs(&self, vars: &[ModelVariable], target: FieldId, out: &mut ModelResidual) {
        let v = &vars[target.index()];
        out.value = v.value;
        out.gradient = v.gradient;
    }
}

/// Writes `1.0` into every residual slot of every field, declared or not.
pub struct UnsolicitedKernel {
    pub fields: Vec<FieldDef>,
}

impl ResidualKernel for UnsolicitedKernel {
    fn name(&self) -> &str {
        "unsolicited"
    }

    fn fields(&self) -> Vec<FieldDef> {
        self.fields.clone()
    }

    fn supports_lhs(&self) -> bool {
        true
    }

    fn residual_rhs(&self, _vars: &[ModelVariable], out: &mut [ModelResidual]) {
        for r in out.iter_mut() {
            r.value = [1.0; 3];
            r.gradient = [[1.0; 3]; 3];
        }
    }

    fn residual_lhs(&self, _vars: &[ModelVariable], _target: FieldId, out: &mut ModelResidual) {
        out.value = [1.0; 3];
        out.gradient = [[1.0; 3]; 3];
    }
}
