//! Replica coordination (§4.6, §1 item 5): primary-forwarding, fan-out
//! replication, and idempotent replica writes.
//!
//! Grounded in `examples/ThomasGraceman-consistent-hashing`'s
//! `replication` crate: that crate's `SimpleStrategy` placement logic
//! moves into `cachering_core::Ring::replicas`; what's left here is the
//! per-request decision of what *this* node should do with a replica set,
//! which the teacher never modeled as its own type.

pub mod error;
pub mod plan;

pub use error::{Error, Result};
pub use plan::Plan;
