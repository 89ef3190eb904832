//! The [`Communicator`] trait.

use crate::codec;
use crate::error::CommError;
use std::fmt;

/// Message tag; receivers check that messages arrive in protocol order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tag(pub u32);

impl Tag {
    /// Reserved for [`Communicator::barrier`].
    pub const BARRIER: Tag = Tag(0xFFFF_0001);
    /// Reserved for [`Communicator::broadcast`].
    pub const BROADCAST: Tag = Tag(0xFFFF_0002);
    /// Reserved for [`Communicator::all_reduce_sum`].
    pub const REDUCE: Tag = Tag(0xFFFF_0003);
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// One partition's endpoint into the collective world.
///
/// # Contract
///
/// - Messages between an ordered pair of ranks are delivered in send order.
/// - `broadcast`, `barrier`, `all_reduce_sum` and `reduce_sum` are
///   collective: every rank calls them in the same sequence.
/// - Sums are formed in rank order, so every rank observes bit-identical
///   results.
pub trait Communicator: Send {
    /// This partition's rank in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of partitions.
    fn size(&self) -> usize;

    /// Send `payload` to `dest`. Does not wait for the receiver.
    fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<(), CommError>;

    /// Receive the next message from `source`, which must carry `tag`.
    fn recv(&self, source: usize, tag: Tag) -> Result<Vec<u8>, CommError>;

    /// Block until every partition has entered the barrier.
    fn barrier(&self) -> Result<(), CommError> {
        if self.rank() == 0 {
            for peer in 1..self.size() {
                self.recv(peer, Tag::BARRIER)?;
            }
            for peer in 1..self.size() {
                self.send(peer, Tag::BARRIER, Vec::new())?;
            }
        } else {
            self.send(0, Tag::BARRIER, Vec::new())?;
            self.recv(0, Tag::BARRIER)?;
        }
        Ok(())
    }

    /// Distribute `payload` from `root` to every partition.
    ///
    /// Non-root partitions pass an empty payload; every partition receives
    /// the root's payload.
    fn broadcast(&self, root: usize, payload: Vec<u8>) -> Result<Vec<u8>, CommError> {
        if root >= self.size() {
            return Err(CommError::InvalidRank {
                rank: root,
                size: self.size(),
            });
        }
        if self.rank() == root {
            for peer in (0..self.size()).filter(|p| *p != root) {
                self.send(peer, Tag::BROADCAST, payload.clone())?;
            }
            Ok(payload)
        } else {
            self.recv(root, Tag::BROADCAST)
        }
    }

    /// Element-wise sum of `values` across partitions, written back on
    /// every partition.
    fn all_reduce_sum(&self, values: &mut [f64]) -> Result<(), CommError> {
        if self.size() == 1 {
            return Ok(());
        }
        if self.rank() == 0 {
            for peer in 1..self.size() {
                let bytes = self.recv(peer, Tag::REDUCE)?;
                let theirs = codec::decode_f64s(&bytes)?;
                if theirs.len() != values.len() {
                    return Err(CommError::PayloadMismatch {
                        peer,
                        expected: values.len(),
                        actual: theirs.len(),
                    });
                }
                for (v, t) in values.iter_mut().zip(theirs) {
                    *v += t;
                }
            }
        } else {
            self.send(0, Tag::REDUCE, codec::encode_f64s(values))?;
        }
        let payload = if self.rank() == 0 {
            codec::encode_f64s(values)
        } else {
            Vec::new()
        };
        let summed = self.broadcast(0, payload)?;
        let summed = codec::decode_f64s(&summed)?;
        if summed.len() != values.len() {
            return Err(CommError::PayloadMismatch {
                peer: 0,
                expected: values.len(),
                actual: summed.len(),
            });
        }
        values.copy_from_slice(&summed);
        Ok(())
    }

    /// Sum of `value` across partitions.
    fn reduce_sum(&self, value: f64) -> Result<f64, CommError> {
        let mut buf = [value];
        self.all_reduce_sum(&mut buf)?;
        Ok(buf[0])
    }
}
