//! Collective communication for partitioned seedbed runs.
//!
//! Every partition holds one [`Communicator`] endpoint. All collective
//! operations are blocking and must be entered by every partition in the
//! same order; any failure is fatal to the run.
//!
//! # Backends
//!
//! - [`SerialComm`]: a world of one partition.
//! - [`ChannelComm`]: `n` in-process partitions, one per thread, connected
//!   by FIFO channels for every ordered pair of ranks.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod channel;
pub mod codec;
pub mod communicator;
pub mod error;
pub mod serial;

pub use channel::ChannelComm;
pub use communicator::{Communicator, Tag};
pub use error::CommError;
pub use serial::SerialComm;
