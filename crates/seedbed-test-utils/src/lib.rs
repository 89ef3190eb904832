//! Test utilities and mock types for seedbed development.
//!
//! Provides an instrumented mesh ([`CountingMesh`]), a map-backed
//! [`FieldReader`]/[`FieldWriter`] ([`MockFields`]), scripted nucleation
//! draws, fixture kernels (see [`fixtures`]) and [`run_world`] for
//! multi-partition tests on threads.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Mutex;
use std::thread;

use seedbed_comm::ChannelComm;
use seedbed_core::{EvalFlags, FieldId, FieldReader, FieldWriter, ResidualFlags};
use seedbed_mesh::{CellResidual, CellValues, Mesh, MeshError, SupportPoint};
use seedbed_nucleation::UniformDraws;

/// Evaluation requests seen for one field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvalCounts {
    /// Calls to `evaluate`.
    pub calls: usize,
    /// Calls that requested values.
    pub values: usize,
    /// Calls that requested gradients.
    pub gradients: usize,
    /// Calls that requested hessians.
    pub hessians: usize,
    /// Calls to `integrate_add`.
    pub integrations: usize,
}

/// A [`Mesh`] wrapper that records every evaluation request per field.
pub struct CountingMesh<M: Mesh> {
    inner: M,
    counts: Mutex<HashMap<FieldId, EvalCounts>>,
}

impl<M: Mesh> CountingMesh<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    /// Requests recorded for `field` so far.
    pub fn counts(&self, field: FieldId) -> EvalCounts {
        self.lock().get(&field).copied().unwrap_or_default()
    }

    /// Forget every recorded request.
    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<FieldId, EvalCounts>> {
        self.counts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<M: Mesh> Mesh for CountingMesh<M> {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn n_points(&self) -> usize {
        self.inner.n_points()
    }

    fn n_cells(&self) -> usize {
        self.inner.n_cells()
    }

    fn local_cells(&self) -> Range<usize> {
        self.inner.local_cells()
    }

    fn n_q_points(&self) -> usize {
        self.inner.n_q_points()
    }

    fn evaluate(
        &self,
        field: FieldId,
        cell: usize,
        src: &[f64],
        flags: EvalFlags,
        out: &mut CellValues,
    ) -> Result<(), MeshError> {
        {
            let mut counts = self.lock();
            let c = counts.entry(field).or_default();
            c.calls += 1;
            c.values += flags.value as usize;
            c.gradients += flags.gradient as usize;
            c.hessians += flags.hessian as usize;
        }
        self.inner.evaluate(field, cell, src, flags, out)
    }

    fn integrate_add(
        &self,
        field: FieldId,
        cell: usize,
        residual: &CellResidual,
        flags: ResidualFlags,
        dst: &mut [f64],
    ) -> Result<(), MeshError> {
        self.lock().entry(field).or_default().integrations += 1;
        self.inner.integrate_add(field, cell, residual, flags, dst)
    }

    fn jxw(&self, cell: usize, q: usize) -> f64 {
        self.inner.jxw(cell, q)
    }

    fn support_points(&self) -> Vec<SupportPoint> {
        self.inner.support_points()
    }

    fn is_owned(&self, point: usize) -> bool {
        self.inner.is_owned(point)
    }

    fn domain_measure(&self) -> f64 {
        self.inner.domain_measure()
    }
}

/// Map-backed implementation of [`FieldReader`] and [`FieldWriter`].
#[derive(Clone, Debug, Default)]
pub struct MockFields {
    fields: HashMap<FieldId, Vec<f64>>,
}

impl MockFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a field.
    pub fn set_field(&mut self, field: FieldId, data: Vec<f64>) {
        self.fields.insert(field, data);
    }

    /// Read back a field for assertions.
    pub fn get_field(&self, field: FieldId) -> Option<&[f64]> {
        self.fields.get(&field).map(|v| v.as_slice())
    }
}

impl FieldReader for MockFields {
    fn read(&self, field: FieldId) -> Option<&[f64]> {
        self.fields.get(&field).map(|v| v.as_slice())
    }
}

impl FieldWriter for MockFields {
    fn write(&mut self, field: FieldId) -> Option<&mut [f64]> {
        self.fields.get_mut(&field).map(|v| v.as_mut_slice())
    }
}

/// Draws fixed per point, `default` elsewhere; the step is ignored.
#[derive(Clone, Debug)]
pub struct ScriptedDraws {
    points: HashMap<u64, f64>,
    default: f64,
}

impl ScriptedDraws {
    /// Every point draws `default`.
    pub fn uniform(default: f64) -> Self {
        Self {
            points: HashMap::new(),
            default,
        }
    }

    /// Point `point` draws `value`.
    pub fn with(mut self, point: u64, value: f64) -> Self {
        self.points.insert(point, value);
        self
    }
}

impl UniformDraws for ScriptedDraws {
    fn draw(&self, _step: u64, point: u64) -> f64 {
        self.points.get(&point).copied().unwrap_or(self.default)
    }
}

/// Run `f` once per rank of an `n`-partition [`ChannelComm`] world, each on
/// its own thread. Results are returned in rank order; a panic on any rank
/// is re-raised.
pub fn run_world<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(ChannelComm) -> T + Sync,
{
    let f = &f;
    thread::scope(|s| {
        let handles: Vec<_> = ChannelComm::world(n)
            .into_iter()
            .map(|comm| s.spawn(move || f(comm)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}
