//! Mesh trait compliance test helpers.
//!
//! These functions verify that a Mesh implementation satisfies the
//! invariants the assembler and the nucleation protocol rely on.

use crate::mesh::Mesh;
use crate::values::{CellResidual, CellValues};
use seedbed_core::{EvalFlags, FieldId, ResidualFlags};

/// Assert that a constant field evaluates to that constant with zero
/// derivatives at every quadrature point.
pub fn assert_constant_reproduced(mesh: &dyn Mesh) {
    let src = vec![2.5; mesh.n_points()];
    let mut out = CellValues::new(mesh.n_q_points(), 1, mesh.dim());
    for cell in mesh.local_cells() {
        mesh.evaluate(FieldId(0), cell, &src, EvalFlags::ALL, &mut out)
            .unwrap();
        for q in 0..mesh.n_q_points() {
            assert!((out.value(q, 0) - 2.5).abs() < 1e-12, "cell {cell} q {q}");
            assert!(out.gradient(q, 0).iter().all(|g| g.abs() < 1e-12));
            assert!(out.hessian(q, 0).iter().all(|h| h.abs() < 1e-12));
        }
    }
}

/// Assert that the gradient of a linear field is exact.
pub fn assert_linear_gradient_exact(mesh: &dyn Mesh) {
    let dim = mesh.dim();
    let slope = [1.0, -2.0, 0.5];
    let src: Vec<f64> = mesh
        .support_points()
        .iter()
        .map(|p| p.coords.iter().zip(slope).map(|(x, s)| x * s).sum::<f64>())
        .collect();
    let mut out = CellValues::new(mesh.n_q_points(), 1, dim);
    for cell in mesh.local_cells() {
        mesh.evaluate(FieldId(0), cell, &src, EvalFlags::GRADIENT, &mut out)
            .unwrap();
        for q in 0..mesh.n_q_points() {
            for d in 0..dim {
                let g = out.gradient(q, 0)[d];
                assert!((g - slope[d]).abs() < 1e-12, "cell {cell} q {q} axis {d}: {g}");
            }
        }
    }
}

/// Assert that quadrature weights over all cells sum to the domain measure.
pub fn assert_weights_sum_to_domain(mesh: &dyn Mesh) {
    let total: f64 = (0..mesh.n_cells())
        .flat_map(|cell| (0..mesh.n_q_points()).map(move |q| (cell, q)))
        .map(|(cell, q)| mesh.jxw(cell, q))
        .sum();
    assert!((total - mesh.domain_measure()).abs() < 1e-10);
}

/// Assert that integrating a gradient residual of a constant vector
/// against a constant field yields zero net contribution.
pub fn assert_gradient_residual_conserves(mesh: &dyn Mesh) {
    let dim = mesh.dim();
    let mut res = CellResidual::new(mesh.n_q_points(), 1, dim);
    for q in 0..mesh.n_q_points() {
        res.submit_gradient(q, 0, &[1.0, 1.0, 1.0][..dim]);
    }
    let mut dst = vec![0.0; mesh.n_points()];
    for cell in mesh.local_cells() {
        mesh.integrate_add(FieldId(0), cell, &res, ResidualFlags::GRADIENT, &mut dst)
            .unwrap();
    }
    let sum: f64 = dst.iter().sum();
    assert!(sum.abs() < 1e-10, "sum of gradient residual {sum}");
}

/// Assert that every point is owned by exactly one partition.
pub fn assert_ownership_partitions_points(parts: &[impl Mesh]) {
    let n = parts[0].n_points();
    for p in 0..n {
        let owners = parts.iter().filter(|m| m.is_owned(p)).count();
        assert_eq!(owners, 1, "point {p} owned by {owners} partitions");
    }
    for m in parts {
        let owned = m.support_points().iter().filter(|s| s.owned).count();
        let direct = (0..n).filter(|p| m.is_owned(*p)).count();
        assert_eq!(owned, direct);
    }
}

/// Assert that local cell ranges tile the cell list without overlap.
pub fn assert_cells_partitioned(parts: &[impl Mesh]) {
    let mut next = 0;
    for m in parts {
        let range = m.local_cells();
        assert_eq!(range.start, next);
        next = range.end;
    }
    assert_eq!(next, parts[0].n_cells());
}

/// Run the single-partition compliance checks on a mesh.
pub fn run_full_compliance(mesh: &dyn Mesh) {
    assert_constant_reproduced(mesh);
    assert_linear_gradient_exact(mesh);
    assert_weights_sum_to_domain(mesh);
    assert_gradient_residual_conserves(mesh);
}
