//! The core [`Mesh`] trait.

use crate::error::MeshError;
use crate::values::{CellResidual, CellValues};
use seedbed_core::{EvalFlags, FieldId, Point, ResidualFlags};
use std::any::Any;
use std::ops::Range;

/// A mesh point together with its ownership on this partition.
#[derive(Clone, Debug, PartialEq)]
pub struct SupportPoint {
    /// Global point index. Scalar fields store this point at `dof`; vector
    /// fields at `dof * dim + c`.
    pub dof: usize,
    /// Physical coordinates.
    pub coords: Point,
    /// Whether this partition is the point's unique owner.
    pub owned: bool,
}

/// Mesh and finite-element collaborator for assembly and nucleation.
///
/// Implementations own cell iteration, shape-function evaluation and
/// degree-of-freedom scatter for one partition of a distributed mesh.
///
/// # Contract
///
/// - `local_cells()` is restartable and returns the same range on every
///   call; cells of different partitions never overlap.
/// - `evaluate()` fills only the quantities named in `flags`; entries for
///   unrequested quantities are unspecified.
/// - `integrate_add()` adds into `dst`; it never overwrites.
/// - Every mesh point is owned by exactly one partition.
///
/// # Thread Safety
///
/// `Sync` is required because energy evaluation shares `&dyn Mesh`
/// between worker threads.
pub trait Mesh: Any + Send + Sync + 'static {
    /// Spatial dimension (1, 2 or 3).
    fn dim(&self) -> usize;

    /// Total number of mesh points across all partitions.
    fn n_points(&self) -> usize;

    /// Total number of cells across all partitions.
    fn n_cells(&self) -> usize;

    /// Cells assembled by this partition.
    fn local_cells(&self) -> Range<usize>;

    /// Quadrature points per cell.
    fn n_q_points(&self) -> usize;

    /// Evaluate `src` (the storage of `field`) on `cell`.
    ///
    /// `field` identifies the field for bookkeeping only; the data comes
    /// from `src`, whose component count is `out.components()`.
    fn evaluate(
        &self,
        field: FieldId,
        cell: usize,
        src: &[f64],
        flags: EvalFlags,
        out: &mut CellValues,
    ) -> Result<(), MeshError>;

    /// Integrate per-quadrature residuals of `cell` against the shape
    /// functions and add the result to `dst`.
    fn integrate_add(
        &self,
        field: FieldId,
        cell: usize,
        residual: &CellResidual,
        flags: ResidualFlags,
        dst: &mut [f64],
    ) -> Result<(), MeshError>;

    /// Quadrature weight times Jacobian determinant.
    fn jxw(&self, cell: usize, q: usize) -> f64;

    /// Every mesh point with its coordinates and ownership, in global
    /// point order.
    fn support_points(&self) -> Vec<SupportPoint>;

    /// Whether this partition owns mesh point `point`.
    fn is_owned(&self, point: usize) -> bool;

    /// Total measure (length, area or volume) of the domain.
    fn domain_measure(&self) -> f64;
}

impl dyn Mesh {
    /// Downcast to a concrete mesh type.
    pub fn downcast_ref<T: Mesh>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}
