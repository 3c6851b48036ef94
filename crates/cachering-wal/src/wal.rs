//! The write-ahead log file itself (§4.3).
//!
//! Grounded in `examples/original_source/wal.{h,cpp}`: a single mutex
//! guarding an append-mode file handle, held across the length prefix,
//! the payload, and the flush, so a completed write is atomic with
//! respect to other writers (§5 "File handle as shared mutable resource").

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use parking_lot::Mutex;

use crate::codec::serialize_entry;
use crate::entry::LogEntry;
use crate::error::{Error, Result};

/// Append-only, framed, checksummed log of cache operations.
///
/// Never rotates or truncates within the scope of this component (§4.3).
pub struct Wal {
    file: Mutex<File>,
    path: PathBuf,
}

impl Wal {
    /// Opens `path` for append in binary mode. Failing to open is fatal
    /// (§4.3, §7 kind 2).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::Open {
                path: path.display().to_string(),
                source: e,
            })?;
        tracing::info!(path = %path.display(), "WAL file opened");
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// The path this WAL was opened against.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one framed batch: a `u32` entry count followed by each
    /// entry's own `u32` length prefix and payload (§6). Returns success
    /// iff every byte reached the OS buffer and the subsequent `flush`
    /// succeeded. A no-op for an empty batch — writing a zero-count header
    /// for nothing to record would only bloat the log.
    pub fn write_batch(&self, node_id: &str, entries: &[LogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(entries.len() as u32)
            .map_err(Error::Write)?;
        for entry in entries {
            let payload = serialize_entry(node_id, entry);
            buf.write_u32::<LittleEndian>(payload.len() as u32)
                .map_err(Error::Write)?;
            buf.extend_from_slice(&payload);
        }

        let mut file = self.file.lock();
        file.write_all(&buf).map_err(Error::Write)?;
        file.flush().map_err(Error::Write)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recovery::recover_from_wal;
    use cachering_core::Cache;

    #[test]
    fn write_batch_then_recover_applies_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");

        {
            let wal = Wal::open(&path).unwrap();
            wal.write_batch(
                "node-a",
                &[
                    LogEntry::put("node-a", "k1", "v1", 3600, 1),
                    LogEntry::put("node-a", "k2", "v2", 3600, 2),
                    LogEntry::remove("node-a", "k1", 3),
                ],
            )
            .unwrap();
        }

        let cache = Cache::new(16).unwrap();
        let applied = recover_from_wal(&path, "node-a", &cache).unwrap();

        assert_eq!(applied, 3);
        assert_eq!(cache.get("k1"), None);
        assert_eq!(cache.get("k2"), Some("v2".to_string()));
    }

    #[test]
    fn empty_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let wal = Wal::open(&path).unwrap();
        wal.write_batch("node-a", &[]).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }
}
