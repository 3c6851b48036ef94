//! The write path (§4.3, §4.4) and recovery path (§4.5): a batching write
//! queue feeding a length-prefixed, checksummed write-ahead log, and a
//! one-shot replay of that log back into a cache on restart.
//!
//! Grounded in `examples/original_source/wal.{h,cpp}`,
//! `write_queue.{h,cpp}`, and `recovery.{h,cpp}` — the original's protobuf
//! message + boost CRC are replaced by a hand-rolled deterministic binary
//! frame (see `codec`) and `crc32fast`, since the wire layout in spec §6 is
//! pinned down to the byte and recovery must parse exactly what the write
//! path produced.

pub mod codec;
pub mod entry;
pub mod error;
pub mod recovery;
pub mod wal;
pub mod write_queue;

pub use entry::{LogEntry, OpType};
pub use error::{Error, Result};
pub use recovery::recover_from_wal;
pub use wal::Wal;
pub use write_queue::{QueueState, WriteQueue};
