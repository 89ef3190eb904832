//! Error types for collective communication.

use std::error::Error;
use std::fmt;

use crate::communicator::Tag;

/// Errors from collective operations. All are fatal to the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommError {
    /// A rank outside `0..size` was addressed.
    InvalidRank {
        /// The offending rank.
        rank: usize,
        /// Number of partitions.
        size: usize,
    },
    /// The peer's endpoint is gone (its partition terminated).
    Disconnected {
        /// The unreachable rank.
        peer: usize,
    },
    /// A message arrived out of protocol order.
    TagMismatch {
        /// The sending rank.
        peer: usize,
        /// Tag the protocol expected next.
        expected: Tag,
        /// Tag actually received.
        actual: Tag,
    },
    /// A payload's size disagrees with what was announced.
    PayloadMismatch {
        /// The sending rank.
        peer: usize,
        /// Announced or required length.
        expected: usize,
        /// Received length.
        actual: usize,
    },
    /// A payload ended before a complete record could be decoded.
    Truncated {
        /// What was being decoded.
        reason: String,
    },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRank { rank, size } => {
                write!(f, "rank {rank} out of range for {size} partitions")
            }
            Self::Disconnected { peer } => write!(f, "partition {peer} disconnected"),
            Self::TagMismatch {
                peer,
                expected,
                actual,
            } => write!(
                f,
                "partition {peer} sent tag {actual}, expected tag {expected}"
            ),
            Self::PayloadMismatch {
                peer,
                expected,
                actual,
            } => write!(
                f,
                "partition {peer} sent {actual} items, expected {expected}"
            ),
            Self::Truncated { reason } => write!(f, "truncated payload: {reason}"),
        }
    }
}

impl Error for CommError {}
