//! The [`ResidualKernel`] trait.

use crate::energy::EnergyDensity;
use crate::variable::{ModelResidual, ModelVariable};
use seedbed_core::{FieldDef, FieldId};

/// Pluggable per-quadrature-point physics.
///
/// # Contract
///
/// - `&self`: kernels are stateless. Every method is a pure function of
///   its arguments; the assembler may call them any number of times, in
///   any cell or quadrature-point order.
/// - `vars` and `out` are indexed by [`FieldId`]: `vars[i]` is the field
///   at roster position `i`. Fields the current pass does not evaluate are
///   zero.
/// - The assembler clears `out` before each call and reads back only the
///   residual slots each field declared. Writing other slots is harmless
///   and ignored.
/// - `fields()` is called once at setup, not per point.
///
/// # Object safety
///
/// This trait is object-safe; sessions store kernels as
/// `Box<dyn ResidualKernel>`.
///
/// # Examples
///
/// Linear relaxation `∂u/∂t = -u` with explicit Euler:
///
/// ```
/// use seedbed_assembly::{ModelResidual, ModelVariable, ResidualKernel};
/// use seedbed_core::{FieldDef, PdeKind};
///
/// struct Relax { dt: f64 }
///
/// impl ResidualKernel for Relax {
///     fn name(&self) -> &str { "relax" }
///     fn fields(&self) -> Vec<FieldDef> {
///         vec![FieldDef::scalar("u", PdeKind::Parabolic)]
///     }
///     fn residual_rhs(&self, vars: &[ModelVariable], out: &mut [ModelResidual]) {
///         out[0].set_scalar((1.0 - self.dt) * vars[0].scalar());
///     }
/// }
///
/// let k = Relax { dt: 0.1 };
/// let mut out = [ModelResidual::default()];
/// let mut u = ModelVariable::new(1, 1);
/// u.value[0] = 2.0;
/// k.residual_rhs(&[u], &mut out);
/// assert!((out[0].value[0] - 1.8).abs() < 1e-12);
/// ```
pub trait ResidualKernel: Send + Sync + 'static {
    /// Human-readable name for diagnostics.
    fn name(&self) -> &str;

    /// The roster this kernel indexes `vars` by, in order.
    fn fields(&self) -> Vec<FieldDef>;

    /// Whether the kernel consumes second derivatives.
    ///
    /// Registries requesting hessians for a kernel that returns `false`
    /// are rejected at setup.
    fn supports_hessians(&self) -> bool {
        false
    }

    /// Whether [`residual_lhs`](Self::residual_lhs) is implemented.
    fn supports_lhs(&self) -> bool {
        false
    }

    /// Explicit residuals for every field at one point.
    fn residual_rhs(&self, vars: &[ModelVariable], out: &mut [ModelResidual]);

    /// Linearised operator residual for `target` at one point.
    ///
    /// `vars[target]` holds the trial perturbation; every other entry holds
    /// the stored solution. Must be linear in `vars[target]`.
    fn residual_lhs(&self, vars: &[ModelVariable], target: FieldId, out: &mut ModelResidual) {
        let _ = (vars, target, out);
    }

    /// Free-energy density at one point, if the model defines one.
    fn energy_density(&self, vars: &[ModelVariable]) -> Option<EnergyDensity> {
        let _ = vars;
        None
    }

    /// Field whose value gates energy accumulation (see
    /// [`EnergyAccumulator`](crate::EnergyAccumulator)).
    fn energy_tracked_field(&self) -> Option<FieldId> {
        None
    }
}
