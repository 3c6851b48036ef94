//! The unit of work flowing from a write handler through the queue into
//! the WAL (§3 `LogEntry`).

use std::time::{SystemTime, UNIX_EPOCH};

/// The operation a [`LogEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    Put = 0,
    Remove = 1,
}

impl OpType {
    pub fn from_u8(b: u8) -> Option<Self> {
        match b {
            0 => Some(OpType::Put),
            1 => Some(OpType::Remove),
            _ => None,
        }
    }
}

/// A single write-ahead-log entry: one cache mutation, tagged with the
/// node that produced it and the sequence number it was assigned at
/// enqueue time.
///
/// Sequence numbers are strictly increasing within a single process
/// lifetime and are advisory only — they are never used to order entries
/// across nodes or across restarts (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub op_type: OpType,
    pub node_id: String,
    pub key: String,
    pub value: String,
    pub ttl: i64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub sequence_number: u64,
}

impl LogEntry {
    /// Builds a PUT entry stamped with the current wall-clock time.
    pub fn put(node_id: impl Into<String>, key: impl Into<String>, value: impl Into<String>, ttl: i64, sequence_number: u64) -> Self {
        Self {
            op_type: OpType::Put,
            node_id: node_id.into(),
            key: key.into(),
            value: value.into(),
            ttl,
            timestamp: now_millis(),
            sequence_number,
        }
    }

    /// Builds a REMOVE entry stamped with the current wall-clock time.
    /// `ttl` is carried as zero — removes have no expiry of their own, but
    /// the field is always present in the wire frame (§6).
    pub fn remove(node_id: impl Into<String>, key: impl Into<String>, sequence_number: u64) -> Self {
        Self {
            op_type: OpType::Remove,
            node_id: node_id.into(),
            key: key.into(),
            value: String::new(),
            ttl: 0,
            timestamp: now_millis(),
            sequence_number,
        }
    }

    /// Whether this entry is still live: `timestamp + ttl > now`, the
    /// filter recovery applies before replaying an entry (§4.5).
    pub fn is_live(&self, now_millis: i64) -> bool {
        self.timestamp.saturating_add(self.ttl.saturating_mul(1000)) > now_millis
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_entry_is_live_within_ttl() {
        let e = LogEntry::put("n1", "k", "v", 60, 1);
        assert!(e.is_live(e.timestamp + 30_000));
        assert!(!e.is_live(e.timestamp + 61_000));
    }
}
