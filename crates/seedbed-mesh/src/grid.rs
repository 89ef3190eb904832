//! Partitioned tensor-product grid with Q1 elements.

use crate::error::MeshError;
use crate::mesh::{Mesh, SupportPoint};
use crate::shape::ShapeTable;
use crate::values::{CellResidual, CellValues};
use seedbed_core::{EvalFlags, FieldId, Point, ResidualFlags, MAX_DIM};
use smallvec::SmallVec;
use std::ops::Range;

/// Vertices per cell in the largest supported dimension.
const MAX_VERTICES: usize = 1 << MAX_DIM;

/// An axis-aligned grid of uniform cells on `[0, extent_0] x ... x [0, extent_d]`.
///
/// Cells and points are numbered with axis 0 fastest. The cell list is
/// split into `size` contiguous ranges, one per rank. A point is owned by
/// the rank owning its *owner cell*: the cell whose lower corner it is,
/// clamped at the upper boundary.
///
/// # Examples
///
/// ```
/// use seedbed_mesh::{Mesh, StructuredGrid};
///
/// let grid = StructuredGrid::new(&[4, 2], &[2.0, 1.0]).unwrap();
/// assert_eq!(grid.n_cells(), 8);
/// assert_eq!(grid.n_points(), 15);
/// assert_eq!(grid.n_q_points(), 4);
///
/// let right = grid.clone().with_partition(1, 2).unwrap();
/// assert_eq!(right.local_cells(), 4..8);
/// ```
#[derive(Clone, Debug)]
pub struct StructuredGrid {
    dim: usize,
    cells: [usize; MAX_DIM],
    extent: [f64; MAX_DIM],
    spacing: [f64; MAX_DIM],
    rank: usize,
    size: usize,
    local: Range<usize>,
    shape: ShapeTable,
}

/// Contiguous cell range assigned to `rank` out of `size` partitions.
pub fn partition_cells(n_cells: usize, size: usize, rank: usize) -> Range<usize> {
    (n_cells * rank / size)..(n_cells * (rank + 1) / size)
}

impl StructuredGrid {
    /// Create a serial grid with `cells[d]` cells along axis `d` spanning
    /// `extent[d]`.
    pub fn new(cells: &[usize], extent: &[f64]) -> Result<Self, MeshError> {
        let dim = cells.len();
        if dim == 0 || dim > MAX_DIM {
            return Err(MeshError::InvalidDimension { dim });
        }
        if extent.len() != dim {
            return Err(MeshError::BufferMismatch {
                what: "extent",
                expected: dim,
                actual: extent.len(),
            });
        }
        if cells.contains(&0) {
            return Err(MeshError::EmptyMesh);
        }
        let mut c = [1usize; MAX_DIM];
        let mut e = [1.0; MAX_DIM];
        let mut h = [1.0; MAX_DIM];
        for d in 0..dim {
            if !(extent[d].is_finite() && extent[d] > 0.0) {
                return Err(MeshError::InvalidExtent {
                    axis: d,
                    value: extent[d],
                });
            }
            c[d] = cells[d];
            e[d] = extent[d];
            h[d] = extent[d] / cells[d] as f64;
        }
        let n_cells: usize = c.iter().product();
        Ok(Self {
            dim,
            cells: c,
            extent: e,
            spacing: h,
            rank: 0,
            size: 1,
            local: 0..n_cells,
            shape: ShapeTable::new(dim, &h),
        })
    }

    /// View of the same grid as partition `rank` of `size`.
    pub fn with_partition(mut self, rank: usize, size: usize) -> Result<Self, MeshError> {
        if size == 0 || rank >= size {
            return Err(MeshError::InvalidPartition { rank, size });
        }
        self.rank = rank;
        self.size = size;
        self.local = partition_cells(self.n_cells(), size, rank);
        Ok(self)
    }

    /// This partition's rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of partitions.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cell counts per axis.
    pub fn cells_per_axis(&self) -> &[usize] {
        &self.cells[..self.dim]
    }

    /// Cell edge length per axis.
    pub fn spacing(&self) -> &[f64] {
        &self.spacing[..self.dim]
    }

    /// Measure of a single cell.
    pub fn cell_measure(&self) -> f64 {
        self.spacing().iter().product()
    }

    /// Rank that assembles `cell`.
    pub fn owner_of_cell(&self, cell: usize) -> usize {
        let n = self.n_cells();
        (0..self.size)
            .find(|r| partition_cells(n, self.size, *r).contains(&cell))
            .unwrap_or(self.size - 1)
    }

    /// Rank that owns mesh point `point`.
    pub fn owner_of_point(&self, point: usize) -> usize {
        let idx = self.point_index(point);
        let mut cell = 0;
        let mut stride = 1;
        for d in 0..self.dim {
            cell += idx[d].min(self.cells[d] - 1) * stride;
            stride *= self.cells[d];
        }
        self.owner_of_cell(cell)
    }

    /// Physical coordinates of mesh point `point`.
    pub fn point_coords(&self, point: usize) -> Point {
        let idx = self.point_index(point);
        (0..self.dim)
            .map(|d| idx[d] as f64 * self.spacing[d])
            .collect()
    }

    /// Global point indices of the vertices of `cell`, in vertex bit order.
    pub fn cell_points(&self, cell: usize) -> SmallVec<[usize; MAX_VERTICES]> {
        let mut base = [0usize; MAX_DIM];
        let mut rest = cell;
        for d in 0..self.dim {
            base[d] = rest % self.cells[d];
            rest /= self.cells[d];
        }
        (0..self.shape.n_v)
            .map(|a| {
                let mut p = 0;
                let mut stride = 1;
                for d in 0..self.dim {
                    p += (base[d] + ((a >> d) & 1)) * stride;
                    stride *= self.cells[d] + 1;
                }
                p
            })
            .collect()
    }

    fn point_index(&self, point: usize) -> [usize; MAX_DIM] {
        let mut idx = [0usize; MAX_DIM];
        let mut rest = point;
        for d in 0..self.dim {
            idx[d] = rest % (self.cells[d] + 1);
            rest /= self.cells[d] + 1;
        }
        idx
    }

    fn check_cell(&self, cell: usize) -> Result<(), MeshError> {
        if cell >= self.n_cells() {
            return Err(MeshError::CellOutOfRange {
                cell,
                n_cells: self.n_cells(),
            });
        }
        Ok(())
    }

    fn check_len(&self, what: &'static str, expected: usize, actual: usize) -> Result<(), MeshError> {
        if expected != actual {
            return Err(MeshError::BufferMismatch {
                what,
                expected,
                actual,
            });
        }
        Ok(())
    }
}

impl Mesh for StructuredGrid {
    fn dim(&self) -> usize {
        self.dim
    }

    fn n_points(&self) -> usize {
        self.cells[..self.dim].iter().map(|n| n + 1).product()
    }

    fn n_cells(&self) -> usize {
        self.cells[..self.dim].iter().product()
    }

    fn local_cells(&self) -> Range<usize> {
        self.local.clone()
    }

    fn n_q_points(&self) -> usize {
        self.shape.n_q
    }

    fn evaluate(
        &self,
        _field: FieldId,
        cell: usize,
        src: &[f64],
        flags: EvalFlags,
        out: &mut CellValues,
    ) -> Result<(), MeshError> {
        self.check_cell(cell)?;
        let comps = out.components();
        if comps > MAX_DIM {
            return Err(MeshError::BufferMismatch {
                what: "components",
                expected: MAX_DIM,
                actual: comps,
            });
        }
        self.check_len("source vector", self.n_points() * comps, src.len())?;
        self.check_len("quadrature buffer", self.shape.n_q, out.n_q_points())?;
        self.check_len("dimension", self.dim, out.dim())?;

        let points = self.cell_points(cell);
        let n_v = points.len();
        let mut local = [0.0; MAX_VERTICES * MAX_DIM];
        for (a, p) in points.iter().enumerate() {
            local[a * comps..(a + 1) * comps].copy_from_slice(&src[p * comps..(p + 1) * comps]);
        }

        for q in 0..self.shape.n_q {
            for c in 0..comps {
                if flags.value {
                    *out.value_mut(q, c) = (0..n_v)
                        .map(|a| self.shape.value(q, a) * local[a * comps + c])
                        .sum();
                }
                if flags.gradient {
                    let g = out.gradient_mut(q, c);
                    g.fill(0.0);
                    for a in 0..n_v {
                        let u = local[a * comps + c];
                        for (gk, dk) in g.iter_mut().zip(self.shape.gradient(q, a)) {
                            *gk += dk * u;
                        }
                    }
                }
                if flags.hessian {
                    let h = out.hessian_mut(q, c);
                    h.fill(0.0);
                    for a in 0..n_v {
                        let u = local[a * comps + c];
                        for (hk, dk) in h.iter_mut().zip(self.shape.hessian(q, a)) {
                            *hk += dk * u;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn integrate_add(
        &self,
        _field: FieldId,
        cell: usize,
        residual: &CellResidual,
        flags: ResidualFlags,
        dst: &mut [f64],
    ) -> Result<(), MeshError> {
        self.check_cell(cell)?;
        let comps = residual.components();
        self.check_len("destination vector", self.n_points() * comps, dst.len())?;
        self.check_len("quadrature buffer", self.shape.n_q, residual.n_q_points())?;
        if flags.is_empty() {
            return Ok(());
        }

        let jxw = self.shape.jxw;
        for (a, p) in self.cell_points(cell).iter().enumerate() {
            for c in 0..comps {
                let mut acc = 0.0;
                for q in 0..self.shape.n_q {
                    if flags.value {
                        acc += self.shape.value(q, a) * residual.value(q, c);
                    }
                    if flags.gradient {
                        acc += self
                            .shape
                            .gradient(q, a)
                            .iter()
                            .zip(residual.gradient(q, c))
                            .map(|(n, r)| n * r)
                            .sum::<f64>();
                    }
                }
                dst[p * comps + c] += acc * jxw;
            }
        }
        Ok(())
    }

    fn jxw(&self, _cell: usize, _q: usize) -> f64 {
        self.shape.jxw
    }

    fn support_points(&self) -> Vec<SupportPoint> {
        (0..self.n_points())
            .map(|p| SupportPoint {
                dof: p,
                coords: self.point_coords(p),
                owned: self.owner_of_point(p) == self.rank,
            })
            .collect()
    }

    fn is_owned(&self, point: usize) -> bool {
        point < self.n_points() && self.owner_of_point(point) == self.rank
    }

    fn domain_measure(&self) -> f64 {
        self.extent[..self.dim].iter().product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance;
    use proptest::prelude::*;

    fn nodal<F: Fn(&[f64]) -> f64>(grid: &StructuredGrid, f: F) -> Vec<f64> {
        (0..grid.n_points())
            .map(|p| f(&grid.point_coords(p)))
            .collect()
    }

    #[test]
    fn rejects_degenerate_construction() {
        assert_eq!(
            StructuredGrid::new(&[], &[]).unwrap_err(),
            MeshError::InvalidDimension { dim: 0 }
        );
        assert_eq!(
            StructuredGrid::new(&[2, 0], &[1.0, 1.0]).unwrap_err(),
            MeshError::EmptyMesh
        );
        assert!(matches!(
            StructuredGrid::new(&[2], &[-1.0]),
            Err(MeshError::InvalidExtent { axis: 0, .. })
        ));
        let g = StructuredGrid::new(&[2], &[1.0]).unwrap();
        assert_eq!(
            g.with_partition(2, 2).unwrap_err(),
            MeshError::InvalidPartition { rank: 2, size: 2 }
        );
    }

    #[test]
    fn bilinear_field_is_reproduced_exactly() {
        let grid = StructuredGrid::new(&[3, 2], &[3.0, 1.0]).unwrap();
        let src = nodal(&grid, |x| 2.0 * x[0] + 3.0 * x[1] + x[0] * x[1]);
        let mut out = CellValues::new(grid.n_q_points(), 1, 2);
        grid.evaluate(FieldId(0), 4, &src, EvalFlags::ALL, &mut out)
            .unwrap();
        // mixed derivative of x*y is one everywhere
        for q in 0..grid.n_q_points() {
            let h = out.hessian(q, 0);
            assert!((h[1] - 1.0).abs() < 1e-12);
            assert!((h[2] - 1.0).abs() < 1e-12);
            assert!(h[0].abs() < 1e-12 && h[3].abs() < 1e-12);
        }
    }

    #[test]
    fn unrequested_quantities_are_left_alone() {
        let grid = StructuredGrid::new(&[2], &[1.0]).unwrap();
        let src = vec![1.0, 2.0, 3.0];
        let mut out = CellValues::new(2, 1, 1);
        out.gradient_mut(0, 0)[0] = -7.0;
        grid.evaluate(FieldId(0), 0, &src, EvalFlags::VALUE, &mut out)
            .unwrap();
        assert_eq!(out.gradient(0, 0), &[-7.0]);
    }

    #[test]
    fn evaluate_checks_buffer_sizes() {
        let grid = StructuredGrid::new(&[2], &[1.0]).unwrap();
        let mut out = CellValues::new(2, 1, 1);
        let err = grid
            .evaluate(FieldId(0), 0, &[0.0; 2], EvalFlags::VALUE, &mut out)
            .unwrap_err();
        assert_eq!(
            err,
            MeshError::BufferMismatch {
                what: "source vector",
                expected: 3,
                actual: 2
            }
        );
        let err = grid
            .evaluate(FieldId(0), 9, &[0.0; 3], EvalFlags::VALUE, &mut out)
            .unwrap_err();
        assert_eq!(err, MeshError::CellOutOfRange { cell: 9, n_cells: 2 });
    }

    #[test]
    fn integrating_unit_value_residual_gives_lumped_measure() {
        let grid = StructuredGrid::new(&[2, 2], &[2.0, 2.0]).unwrap();
        let mut res = CellResidual::new(grid.n_q_points(), 1, 2);
        for q in 0..grid.n_q_points() {
            res.submit_value(q, 0, 1.0);
        }
        let mut dst = vec![0.0; grid.n_points()];
        for cell in grid.local_cells() {
            grid.integrate_add(FieldId(0), cell, &res, ResidualFlags::VALUE, &mut dst)
                .unwrap();
        }
        let total: f64 = dst.iter().sum();
        assert!((total - grid.domain_measure()).abs() < 1e-12);
        // centre node touches four cells, each contributing a quarter
        assert!((dst[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn full_compliance_serial_and_partitioned() {
        for (cells, extent) in [
            (vec![5], vec![1.0]),
            (vec![3, 4], vec![1.5, 2.0]),
            (vec![2, 2, 3], vec![1.0, 1.0, 1.5]),
        ] {
            let grid = StructuredGrid::new(&cells, &extent).unwrap();
            compliance::run_full_compliance(&grid);
            for size in [2, 3, 7] {
                let parts: Vec<StructuredGrid> = (0..size)
                    .map(|r| grid.clone().with_partition(r, size).unwrap())
                    .collect();
                compliance::assert_ownership_partitions_points(&parts);
                compliance::assert_cells_partitioned(&parts);
            }
        }
    }

    proptest! {
        #[test]
        fn partition_ranges_tile_the_cell_list(n in 1usize..200, size in 1usize..16) {
            let mut next = 0;
            for r in 0..size {
                let range = partition_cells(n, size, r);
                prop_assert_eq!(range.start, next);
                next = range.end;
            }
            prop_assert_eq!(next, n);
        }
    }
}
