//! Core data structures for a single cache node: the consistent-hash ring
//! (§4.1) and the TTL/LRU cache (§4.2).
//!
//! Everything the write path, recovery path, and replica coordinator in
//! `cachering-wal` / `cachering-node` need lives here: node identity, the
//! ring that maps keys to replica sets, and the in-memory store the ring
//! ultimately serves reads and writes out of.

pub mod cache;
pub mod error;
pub mod hash;
pub mod node_id;
pub mod ring;

pub use cache::Cache;
pub use error::{Error, Result};
pub use node_id::NodeId;
pub use ring::Ring;
