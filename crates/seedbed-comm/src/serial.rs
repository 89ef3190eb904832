//! A world of one partition.

use crate::communicator::{Communicator, Tag};
use crate::error::CommError;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Single-partition communicator.
///
/// Collectives are trivial; point-to-point messages to rank 0 loop back
/// through an internal queue.
#[derive(Debug, Default)]
pub struct SerialComm {
    loopback: Mutex<VecDeque<(Tag, Vec<u8>)>>,
}

impl SerialComm {
    /// Create the endpoint.
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, rank: usize) -> Result<(), CommError> {
        if rank != 0 {
            return Err(CommError::InvalidRank { rank, size: 1 });
        }
        Ok(())
    }
}

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<(), CommError> {
        self.check(dest)?;
        self.loopback
            .lock()
            .map_err(|_| CommError::Disconnected { peer: 0 })?
            .push_back((tag, payload));
        Ok(())
    }

    fn recv(&self, source: usize, tag: Tag) -> Result<Vec<u8>, CommError> {
        self.check(source)?;
        let (actual, payload) = self
            .loopback
            .lock()
            .map_err(|_| CommError::Disconnected { peer: 0 })?
            .pop_front()
            .ok_or(CommError::Disconnected { peer: 0 })?;
        if actual != tag {
            return Err(CommError::TagMismatch {
                peer: 0,
                expected: tag,
                actual,
            });
        }
        Ok(payload)
    }

    fn barrier(&self) -> Result<(), CommError> {
        Ok(())
    }
}
