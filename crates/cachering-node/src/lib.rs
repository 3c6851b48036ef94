//! The node coordinator (C6, §4.6): wires the ring, cache, write queue,
//! and recovery manager together and exposes them over gRPC.

pub mod error;
pub mod node;
pub mod transport;

pub use error::{Error, Result};
pub use node::{Node, NodeConfig};
