//! In-process partitions connected by crossbeam channels.
//!
//! [`ChannelComm::world`] builds one endpoint per rank. Every ordered pair
//! of ranks gets its own unbounded FIFO, so sends never block and
//! messages between two ranks arrive in send order. Endpoints are moved
//! onto worker threads; dropping an endpoint disconnects it, and peers
//! blocked on it observe [`CommError::Disconnected`] instead of hanging.

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

use crate::communicator::{Communicator, Tag};
use crate::error::CommError;

/// A message in flight.
struct Envelope {
    tag: Tag,
    data: Vec<u8>,
}

/// One rank's endpoint in an in-process world.
pub struct ChannelComm {
    rank: usize,
    size: usize,
    /// Indexed by destination rank.
    outboxes: Vec<Sender<Envelope>>,
    /// Indexed by source rank.
    inboxes: Vec<Receiver<Envelope>>,
}

impl ChannelComm {
    /// Create a world of `size` connected endpoints, indexed by rank.
    ///
    /// A `size` of zero yields an empty world.
    pub fn world(size: usize) -> Vec<ChannelComm> {
        let mut outboxes: Vec<Vec<Sender<Envelope>>> = (0..size).map(|_| Vec::new()).collect();
        let mut inboxes: Vec<Vec<Receiver<Envelope>>> = (0..size).map(|_| Vec::new()).collect();
        // outboxes[src][dst] feeds inboxes[dst][src]
        for src_out in outboxes.iter_mut() {
            for dst_in in inboxes.iter_mut() {
                let (tx, rx) = crossbeam_channel::unbounded();
                src_out.push(tx);
                dst_in.push(rx);
            }
        }
        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| ChannelComm {
                rank,
                size,
                outboxes,
                inboxes,
            })
            .collect()
    }

    fn check(&self, rank: usize) -> Result<(), CommError> {
        if rank >= self.size {
            return Err(CommError::InvalidRank {
                rank,
                size: self.size,
            });
        }
        Ok(())
    }
}

impl Communicator for ChannelComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn send(&self, dest: usize, tag: Tag, payload: Vec<u8>) -> Result<(), CommError> {
        self.check(dest)?;
        self.outboxes[dest]
            .send(Envelope { tag, data: payload })
            .map_err(|_| {
                debug!(rank = self.rank, peer = dest, %tag, "send to disconnected partition");
                CommError::Disconnected { peer: dest }
            })
    }

    fn recv(&self, source: usize, tag: Tag) -> Result<Vec<u8>, CommError> {
        self.check(source)?;
        let envelope = self.inboxes[source].recv().map_err(|_| {
            debug!(rank = self.rank, peer = source, %tag, "receive from disconnected partition");
            CommError::Disconnected { peer: source }
        })?;
        if envelope.tag != tag {
            return Err(CommError::TagMismatch {
                peer: source,
                expected: tag,
                actual: envelope.tag,
            });
        }
        Ok(envelope.data)
    }
}
