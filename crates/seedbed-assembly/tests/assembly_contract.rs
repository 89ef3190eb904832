//! Assembler behaviour observed through instrumented meshes and fixture
//! kernels.

use proptest::prelude::*;
use seedbed_assembly::{
    Assembler, AssemblyError, RequirementTable, VariableRegistry, VariableRequirements,
};
use seedbed_core::{EvalFlags, FieldDef, FieldId, FieldState, PdeKind, ResidualFlags};
use seedbed_mesh::{Mesh, StructuredGrid};
use seedbed_test_utils::fixtures::{DiffusionKernel, ProbeKernel, UnsolicitedKernel};
use seedbed_test_utils::CountingMesh;

const A: FieldId = FieldId(0);
const B: FieldId = FieldId(1);
const U: FieldId = FieldId(2);

fn roster() -> Vec<FieldDef> {
    vec![
        FieldDef::scalar("a", PdeKind::Parabolic),
        FieldDef::scalar("b", PdeKind::Parabolic),
        FieldDef::vector("u", PdeKind::Elliptic),
    ]
}

fn grid() -> StructuredGrid {
    StructuredGrid::new(&[3, 2], &[1.5, 1.0]).unwrap()
}

fn ramp(state: &mut FieldState, field: FieldId, scale: f64) {
    for (i, v) in state.field_mut(field).unwrap().iter_mut().enumerate() {
        *v = scale * (i as f64 * 0.37).sin();
    }
}

#[test]
fn unneeded_derivatives_are_never_requested() {
    let mesh = CountingMesh::new(grid());
    let mut table = RequirementTable::new();
    table.insert(
        "a".into(),
        VariableRequirements::explicit(EvalFlags::VALUE, ResidualFlags::VALUE)
            .with_lhs(EvalFlags::VALUE, ResidualFlags::VALUE),
    );
    table.insert(
        "b".into(),
        VariableRequirements::explicit(EvalFlags::GRADIENT, ResidualFlags::GRADIENT),
    );
    let registry = VariableRegistry::build(&roster(), &table, 2).unwrap();
    let kernel = ProbeKernel::new(roster());
    registry.check_kernel(&kernel).unwrap();

    let state = FieldState::zeros(&roster(), mesh.n_points(), 2);
    let mut dst = state.zeros_like();
    let asm = Assembler::new(&mesh, &registry, &kernel);
    asm.assemble_rhs(&state, &mut dst, mesh.local_cells()).unwrap();

    let cells = mesh.n_cells();
    let a = mesh.counts(A);
    assert_eq!((a.calls, a.values, a.gradients, a.hessians), (cells, cells, 0, 0));
    let b = mesh.counts(B);
    assert_eq!((b.calls, b.values, b.gradients, b.hessians), (cells, 0, cells, 0));
    let u = mesh.counts(U);
    assert_eq!((u.calls, u.integrations), (0, 0));

    mesh.reset();
    let trial = vec![1.0; mesh.n_points()];
    let mut out = vec![0.0; mesh.n_points()];
    asm.apply_lhs(A, &trial, &state, &mut out, mesh.local_cells())
        .unwrap();
    assert_eq!(mesh.counts(A).gradients, 0);
    assert_eq!(mesh.counts(B).calls, 0);
    assert_eq!(mesh.counts(U).calls, 0);
}

#[test]
fn undeclared_residuals_are_discarded() {
    let mesh = grid();
    let mut table = RequirementTable::new();
    table.insert(
        "a".into(),
        VariableRequirements::explicit(EvalFlags::NONE, ResidualFlags::VALUE),
    );
    let registry = VariableRegistry::build(&roster(), &table, 2).unwrap();
    let kernel = UnsolicitedKernel { fields: roster() };

    let state = FieldState::zeros(&roster(), mesh.n_points(), 2);
    let mut dst = state.zeros_like();
    Assembler::new(&mesh, &registry, &kernel)
        .assemble_rhs(&state, &mut dst, mesh.local_cells())
        .unwrap();

    // a gets ∫φ_i exactly: h_x h_y scaled by ½ per boundary axis
    let h = mesh.spacing().to_vec();
    for (p, got) in dst.field(A).unwrap().iter().enumerate() {
        let x = mesh.point_coords(p);
        let mut want = h[0] * h[1];
        for d in 0..2 {
            if x[d].abs() < 1e-12 || (x[d] - [1.5, 1.0][d]).abs() < 1e-12 {
                want *= 0.5;
            }
        }
        assert!((got - want).abs() < 1e-14, "point {p}: {got} vs {want}");
    }
    assert!(dst.field(B).unwrap().iter().all(|v| *v == 0.0));
    assert!(dst.field(U).unwrap().iter().all(|v| *v == 0.0));
}

#[test]
fn explicit_pass_leaves_input_untouched() {
    let mesh = grid();
    let kernel = DiffusionKernel::new(0.1, 2.0);
    let registry =
        VariableRegistry::build(&kernel_fields(&kernel), &DiffusionKernel::requirements(), 2)
            .unwrap();
    let mut state = FieldState::zeros(&kernel_fields(&kernel), mesh.n_points(), 2);
    ramp(&mut state, A, 1.0);
    let before = state.clone();
    let mut dst = state.zeros_like();
    Assembler::new(&mesh, &registry, &kernel)
        .assemble_rhs(&state, &mut dst, mesh.local_cells())
        .unwrap();
    assert_eq!(state, before);
    assert!(dst.field(A).unwrap().iter().any(|v| *v != 0.0));
}

#[test]
fn operator_rejects_bad_targets_and_lengths() {
    let mesh = grid();
    let kernel = DiffusionKernel::new(0.1, 2.0);
    let registry =
        VariableRegistry::build(&kernel_fields(&kernel), &DiffusionKernel::requirements(), 2)
            .unwrap();
    let state = FieldState::zeros(&kernel_fields(&kernel), mesh.n_points(), 2);
    let asm = Assembler::new(&mesh, &registry, &kernel);
    let mut out = vec![0.0; mesh.n_points()];
    let err = asm
        .apply_lhs(FieldId(5), &out.clone(), &state, &mut out, mesh.local_cells())
        .unwrap_err();
    assert_eq!(err, AssemblyError::TargetNotInLhs { field: FieldId(5) });
    let err = asm
        .apply_lhs(A, &[1.0; 3], &state, &mut out, mesh.local_cells())
        .unwrap_err();
    assert!(matches!(err, AssemblyError::VectorLength { what: "trial vector", .. }));
}

#[test]
fn worker_count_does_not_change_energy() {
    let mesh = StructuredGrid::new(&[6, 5], &[3.0, 2.5]).unwrap();
    let kernel = DiffusionKernel::new(0.1, 0.7);
    let registry =
        VariableRegistry::build(&kernel_fields(&kernel), &DiffusionKernel::requirements(), 2)
            .unwrap();
    let mut state = FieldState::zeros(&kernel_fields(&kernel), mesh.n_points(), 2);
    ramp(&mut state, A, 2.0);
    let asm = Assembler::new(&mesh, &registry, &kernel);
    let one = asm.local_energy(&state, 1, 1e-10).unwrap();
    for workers in [2, 3, 7, 64] {
        let many = asm.local_energy(&state, workers, 1e-10).unwrap();
        let (a, b) = (one.totals(), many.totals());
        assert!((a.total - b.total).abs() < 1e-12 * a.total.abs().max(1.0));
        assert!((a.gradient - b.gradient).abs() < 1e-12 * a.gradient.abs().max(1.0));
        assert_eq!(one.accepted() + one.excluded(), many.accepted() + many.excluded());
    }
}

#[test]
fn negligible_tracked_field_contributes_no_energy() {
    let mesh = grid();
    let kernel = DiffusionKernel::new(0.1, 0.7);
    let registry =
        VariableRegistry::build(&kernel_fields(&kernel), &DiffusionKernel::requirements(), 2)
            .unwrap();
    let mut state = FieldState::zeros(&kernel_fields(&kernel), mesh.n_points(), 2);
    state.fill(A, 1e-12).unwrap();
    let acc = Assembler::new(&mesh, &registry, &kernel)
        .local_energy(&state, 2, 1e-10)
        .unwrap();
    assert_eq!(acc.totals().total, 0.0);
    assert_eq!(acc.accepted(), 0);
    assert_eq!(acc.excluded(), mesh.n_cells() * mesh.n_q_points());
}

fn kernel_fields(k: &DiffusionKernel) -> Vec<FieldDef> {
    use seedbed_assembly::ResidualKernel;
    k.fields()
}

proptest! {
    #[test]
    fn operator_is_linear(
        x1 in prop::collection::vec(-1.0f64..1.0, 12),
        x2 in prop::collection::vec(-1.0f64..1.0, 12),
        a in -3.0f64..3.0,
        b in -3.0f64..3.0,
    ) {
        let mesh = grid();
        prop_assume!(mesh.n_points() == 12);
        let kernel = DiffusionKernel::new(0.05, 1.3);
        let registry = VariableRegistry::build(
            &kernel_fields(&kernel),
            &DiffusionKernel::requirements(),
            2,
        )
        .unwrap();
        let state = FieldState::zeros(&kernel_fields(&kernel), mesh.n_points(), 2);
        let asm = Assembler::new(&mesh, &registry, &kernel);
        let apply = |x: &[f64]| {
            let mut out = vec![0.0; x.len()];
            asm.apply_lhs(A, x, &state, &mut out, mesh.local_cells()).unwrap();
            out
        };
        let combo: Vec<f64> = x1.iter().zip(&x2).map(|(p, q)| a * p + b * q).collect();
        let (y1, y2, y) = (apply(&x1), apply(&x2), apply(&combo));
        for i in 0..y.len() {
            prop_assert!((y[i] - (a * y1[i] + b * y2[i])).abs() < 1e-12);
        }
    }
}
