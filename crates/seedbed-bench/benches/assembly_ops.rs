//! Criterion micro-benchmarks for residual assembly and energy.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use seedbed_bench::{perturbed_state, reference_profile};
use seedbed_core::FieldId;
use seedbed_engine::Session;

/// Benchmark: explicit residuals of c, n1, n2 and u on a 64x64 grid.
fn bench_assemble_rhs_4k(c: &mut Criterion) {
    let session = Session::new(reference_profile(42)).unwrap();
    let state = perturbed_state(&session, 42);

    c.bench_function("assemble_rhs_4k", |b| {
        b.iter(|| {
            let r = session.assemble_rhs(&state).unwrap();
            black_box(&r);
        });
    });
}

/// Benchmark: one elasticity operator application on a 64x64 grid.
fn bench_apply_lhs_displacement_4k(c: &mut Criterion) {
    let session = Session::new(reference_profile(42)).unwrap();
    let state = perturbed_state(&session, 42);
    let u = FieldId(3);
    let trial: Vec<f64> = (0..state.field(u).unwrap().len())
        .map(|i| (i as f64 * 0.01).sin())
        .collect();

    c.bench_function("apply_lhs_displacement_4k", |b| {
        b.iter(|| {
            let r = session.apply_lhs_operator(u, &trial, &state).unwrap();
            black_box(&r);
        });
    });
}

/// Benchmark: energy with one and four worker threads.
fn bench_energy_workers(c: &mut Criterion) {
    for workers in [1, 4] {
        let session = Session::new(reference_profile(42).with_energy_workers(workers)).unwrap();
        let state = perturbed_state(&session, 42);
        c.bench_function(&format!("compute_energy_4k_{workers}w"), |b| {
            b.iter(|| {
                let e = session.compute_energy(&state).unwrap();
                black_box(e);
            });
        });
    }
}

criterion_group!(
    benches,
    bench_assemble_rhs_4k,
    bench_apply_lhs_displacement_4k,
    bench_energy_workers
);
criterion_main!(benches);
