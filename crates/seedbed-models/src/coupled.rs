//! Coupled Cahn-Hilliard / Allen-Cahn / mechanics kernel.
//!
//! Roster: `c`, one scalar per order parameter, then `u` when the model is
//! elastic. Free energy density:
//!
//! ```text
//! f = (1 − H) f_α(c) + H f_β(c) + W Σ g(n_i) + ½ Σ ∇n_i·κ_i·∇n_i + ½ S:E
//! H = Σ h(n_i),  E = sym∇u − Σ h(n_i) ε⁰_i(c),  S = C(H):E
//! ```
//!
//! The explicit pass gives forward-Euler residuals for `c` and `n_i` and
//! the stress residual `−S` for `u`; the operator pass gives `C(H):sym∇δu`.
//! The concentration dependence of `ε⁰` enters the stress and the
//! Allen-Cahn force but not the chemical potential.

use crate::elasticity::{double_contract, Tensor2};
use crate::material::{barrier, barrier_derivative, MaterialModel};
use seedbed_assembly::{
    EnergyDensity, ModelResidual, ModelVariable, RequirementTable, ResidualKernel,
    VariableRequirements,
};
use seedbed_core::{EvalFlags, FieldDef, FieldId, PdeKind, ResidualFlags, MAX_DIM};

/// Concentration field name.
pub const CONCENTRATION: &str = "c";
/// Displacement field name.
pub const DISPLACEMENT: &str = "u";

/// Residual kernel for precipitate growth with coherency strain.
#[derive(Clone, Debug)]
pub struct CoupledChAcMechanics {
    model: MaterialModel,
}

/// Per-point quantities shared by the residual and energy paths.
struct PointState {
    h_sum: f64,
    strain: Tensor2,
    stress: Tensor2,
}

impl CoupledChAcMechanics {
    /// Field id of the concentration.
    pub const C: FieldId = FieldId(0);

    /// Wrap a validated model.
    pub fn new(model: MaterialModel) -> Self {
        Self { model }
    }

    /// The material model.
    pub fn model(&self) -> &MaterialModel {
        &self.model
    }

    /// Field id of order parameter `i`.
    pub fn order_parameter(&self, i: usize) -> FieldId {
        FieldId(1 + i as u32)
    }

    /// Field id of the displacement, if mechanics is coupled.
    pub fn displacement(&self) -> Option<FieldId> {
        self.model
            .elasticity
            .as_ref()
            .map(|_| FieldId(1 + self.model.variant_count() as u32))
    }

    /// The evaluation needs and residual outputs of every field.
    pub fn requirements(&self) -> RequirementTable {
        let mut table = RequirementTable::new();
        let both = VariableRequirements::explicit(EvalFlags::VALUE_GRADIENT, ResidualFlags::BOTH);
        table.insert(CONCENTRATION.to_string(), both);
        let heterogeneous = self
            .model
            .elasticity
            .as_ref()
            .is_some_and(|e| e.heterogeneous);
        for op in &self.model.order_parameters {
            let req = if heterogeneous {
                both.with_lhs(EvalFlags::VALUE, ResidualFlags::NONE)
            } else {
                both
            };
            table.insert(op.name.clone(), req);
        }
        if self.model.elasticity.is_some() {
            table.insert(
                DISPLACEMENT.to_string(),
                VariableRequirements::explicit(EvalFlags::GRADIENT, ResidualFlags::GRADIENT)
                    .with_lhs(EvalFlags::GRADIENT, ResidualFlags::GRADIENT),
            );
        }
        table
    }

    fn h_sum(&self, vars: &[ModelVariable]) -> f64 {
        let h = self.model.interpolation;
        (0..self.model.variant_count())
            .map(|i| h.value(vars[1 + i].scalar()))
            .sum()
    }

    fn point_state(&self, vars: &[ModelVariable]) -> PointState {
        let dim = self.model.dim;
        let h_sum = self.h_sum(vars);
        let mut strain = [[0.0; MAX_DIM]; MAX_DIM];
        let mut stress = [[0.0; MAX_DIM]; MAX_DIM];
        if let (Some(el), Some(u)) = (self.model.elasticity.as_ref(), self.displacement()) {
            let c = vars[0].scalar();
            let h = self.model.interpolation;
            strain = vars[u.index()].symmetric_gradient();
            for (i, op) in self.model.order_parameters.iter().enumerate() {
                let hi = h.value(vars[1 + i].scalar());
                let e0 = op.eigenstrain.at(c);
                for a in 0..dim {
                    for b in 0..dim {
                        strain[a][b] -= hi * e0[a][b];
                    }
                }
            }
            stress = el.stiffness(h_sum).stress(&strain);
        }
        PointState {
            h_sum,
            strain,
            stress,
        }
    }
}

impl ResidualKernel for CoupledChAcMechanics {
    fn name(&self) -> &str {
        "coupled_ch_ac_mechanics"
    }

    fn fields(&self) -> Vec<FieldDef> {
        let mut fields = vec![FieldDef::scalar(CONCENTRATION, PdeKind::Parabolic)];
        fields.extend(
            self.model
                .order_parameters
                .iter()
                .map(|op| FieldDef::scalar(op.name.clone(), PdeKind::Parabolic)),
        );
        if self.model.elasticity.is_some() {
            fields.push(FieldDef::vector(DISPLACEMENT, PdeKind::Elliptic));
        }
        fields
    }

    fn supports_lhs(&self) -> bool {
        self.model.elasticity.is_some()
    }

    fn residual_rhs(&self, vars: &[ModelVariable], out: &mut [ModelResidual]) {
        let m = &self.model;
        let dim = m.dim;
        let h = m.interpolation;
        let c = vars[0].scalar();
        let grad_c = vars[0].scalar_gradient();
        let st = self.point_state(vars);

        let fa = m.matrix_energy.value(c);
        let fb = m.precipitate_energy.value(c);
        let dfa = m.matrix_energy.derivative(c);
        let dfb = m.precipitate_energy.derivative(c);
        let fcc = (1.0 - st.h_sum) * m.matrix_energy.second_derivative(c)
            + st.h_sum * m.precipitate_energy.second_derivative(c);

        // ∇μ = f_cc ∇c + Σ f_cn_i ∇n_i
        let mut grad_mu = [0.0; MAX_DIM];
        for d in 0..dim {
            grad_mu[d] = fcc * grad_c[d];
        }

        let el = m.elasticity.as_ref();
        let d_stiffness = el
            .filter(|e| e.heterogeneous)
            .map(|e| e.matrix.difference(&e.precipitate));

        for (i, op) in m.order_parameters.iter().enumerate() {
            let var = &vars[1 + i];
            let n = var.scalar();
            let grad_n = var.scalar_gradient();
            let dh = h.derivative(n);

            let fcn = dh * (dfb - dfa);
            for d in 0..dim {
                grad_mu[d] += fcn * grad_n[d];
            }

            let mut force = dh * (fb - fa) + m.barrier_height * barrier_derivative(n);
            if el.is_some() {
                // ∂E/∂n_i = −h'(n_i) ε⁰_i
                let e0 = op.eigenstrain.at(c);
                force -= dh * double_contract(&st.stress, &e0, dim);
                if let Some(dc) = &d_stiffness {
                    let ds = dc.stress(&st.strain);
                    force += 0.5 * dh * double_contract(&ds, &st.strain, dim);
                }
            }

            let r = &mut out[1 + i];
            r.set_scalar(n - m.dt * m.mobility_n * force);
            for a in 0..dim {
                let flux: f64 = (0..dim)
                    .map(|b| op.gradient_coefficient[a][b] * grad_n[b])
                    .sum();
                r.gradient[0][a] = -m.dt * m.mobility_n * flux;
            }
        }

        let r = &mut out[0];
        r.set_scalar(c);
        for d in 0..dim {
            r.gradient[0][d] = -m.dt * m.mobility_c * grad_mu[d];
        }

        if let Some(u) = self.displacement() {
            let r = &mut out[u.index()];
            for a in 0..dim {
                for b in 0..dim {
                    r.gradient[a][b] = -st.stress[a][b];
                }
            }
        }
    }

    fn residual_lhs(&self, vars: &[ModelVariable], target: FieldId, out: &mut ModelResidual) {
        let (Some(el), Some(u)) = (self.model.elasticity.as_ref(), self.displacement()) else {
            return;
        };
        if target != u {
            return;
        }
        let dim = self.model.dim;
        let strain = vars[u.index()].symmetric_gradient();
        let stress = el.stiffness(self.h_sum(vars)).stress(&strain);
        for a in 0..dim {
            for b in 0..dim {
                out.gradient[a][b] = stress[a][b];
            }
        }
    }

    fn energy_density(&self, vars: &[ModelVariable]) -> Option<EnergyDensity> {
        let m = &self.model;
        let dim = m.dim;
        let c = vars[0].scalar();
        let st = self.point_state(vars);

        let mut chemical = (1.0 - st.h_sum) * m.matrix_energy.value(c)
            + st.h_sum * m.precipitate_energy.value(c);
        let mut gradient = 0.0;
        for (i, op) in m.order_parameters.iter().enumerate() {
            let var = &vars[1 + i];
            chemical += m.barrier_height * barrier(var.scalar());
            let g = var.scalar_gradient();
            for a in 0..dim {
                for b in 0..dim {
                    gradient += 0.5 * g[a] * op.gradient_coefficient[a][b] * g[b];
                }
            }
        }
        let elastic = 0.5 * double_contract(&st.stress, &st.strain, dim);
        Some(EnergyDensity {
            chemical,
            gradient,
            elastic,
        })
    }

    fn energy_tracked_field(&self) -> Option<FieldId> {
        Some(Self::C)
    }
}
