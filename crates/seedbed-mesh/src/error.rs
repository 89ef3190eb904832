//! Error types for mesh construction and evaluation.

use std::fmt;

/// Errors arising from mesh construction or per-cell evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    /// Attempted to construct a mesh with zero cells.
    EmptyMesh,
    /// Spatial dimension outside `1..=3`.
    InvalidDimension {
        /// The requested dimension.
        dim: usize,
    },
    /// An axis extent is zero, negative or not finite.
    InvalidExtent {
        /// Axis index.
        axis: usize,
        /// The offending extent.
        value: f64,
    },
    /// A cell index lies outside the mesh.
    CellOutOfRange {
        /// The offending cell.
        cell: usize,
        /// Number of cells in the mesh.
        n_cells: usize,
    },
    /// A buffer does not have the size the mesh requires.
    BufferMismatch {
        /// Which buffer was wrong.
        what: &'static str,
        /// Required size.
        expected: usize,
        /// Supplied size.
        actual: usize,
    },
    /// Rank is not smaller than the partition count, or the count is zero.
    InvalidPartition {
        /// Requested rank.
        rank: usize,
        /// Requested partition count.
        size: usize,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMesh => write!(f, "mesh must have at least one cell"),
            Self::InvalidDimension { dim } => {
                write!(f, "dimension {dim} not supported, expected 1, 2 or 3")
            }
            Self::InvalidExtent { axis, value } => {
                write!(f, "extent {value} on axis {axis} must be finite and positive")
            }
            Self::CellOutOfRange { cell, n_cells } => {
                write!(f, "cell {cell} out of range [0, {n_cells})")
            }
            Self::BufferMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what} has {actual} entries, expected {expected}"),
            Self::InvalidPartition { rank, size } => {
                write!(f, "rank {rank} invalid for {size} partitions")
            }
        }
    }
}

impl std::error::Error for MeshError {}
