//! One-shot WAL replay into a cache, filtered by node identity and TTL
//! (§4.5).
//!
//! Grounded in `examples/original_source/recovery.cpp`: read a batch
//! count, then for each entry read its length prefix and payload,
//! deserialize, and — if it belongs to this node and hasn't expired —
//! apply it. A malformed entry is logged and skipped; a truncated region
//! at EOF ends the loop cleanly; failing to open the file at all is
//! fatal.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use byteorder::{LittleEndian, ReadBytesExt};

use cachering_core::Cache;

use crate::codec::deserialize_entry;
use crate::entry::OpType;
use crate::error::{Error, Result};

/// Reads `len` bytes into a fresh buffer, returning `Ok(None)` on a clean
/// EOF (zero bytes consumed before hitting the end) and `Ok(Some(_))`
/// otherwise. Any other I/O error is propagated.
fn try_read_exact(reader: &mut impl Read, len: usize) -> Result<Option<Vec<u8>>> {
    let mut buf = vec![0u8; len];
    match reader.read_exact(&mut buf) {
        Ok(()) => Ok(Some(buf)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(Error::Read(e)),
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before Unix epoch")
        .as_millis() as i64
}

/// Replays the WAL at `path` into `cache`, applying only entries whose
/// `node_id` matches `node_id` and that have not yet expired
/// (`timestamp + ttl > now`). Returns the number of entries applied.
///
/// Entries are applied in WAL order, so the last write to a given key
/// wins (§4.5 replay order).
pub fn recover_from_wal(path: impl AsRef<Path>, node_id: &str, cache: &Cache) -> Result<usize> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "starting WAL recovery");

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!("no WAL file found, starting with an empty cache");
            return Ok(0);
        }
        Err(e) => return Err(Error::Open {
            path: path.display().to_string(),
            source: e,
        }),
    };
    let mut reader = BufReader::new(file);
    let now = now_millis();
    let mut applied = 0usize;

    loop {
        let header = match try_read_exact(&mut reader, 4)? {
            Some(bytes) => LittleEndian::read_u32(&bytes),
            None => break, // clean EOF between batches
        };

        for _ in 0..header {
            let len_bytes = match try_read_exact(&mut reader, 4)? {
                Some(bytes) => bytes,
                None => {
                    tracing::warn!("WAL truncated mid-batch, ending recovery");
                    return Ok(applied);
                }
            };
            let len = LittleEndian::read_u32(&len_bytes[..]) as usize;
            let payload = match try_read_exact(&mut reader, len)? {
                Some(bytes) => bytes,
                None => {
                    tracing::warn!("WAL truncated mid-entry, ending recovery");
                    return Ok(applied);
                }
            };

            match deserialize_entry(&payload) {
                Ok(entry) => {
                    if entry.node_id == node_id && entry.is_live(now) {
                        match entry.op_type {
                            OpType::Put => {
                                let ttl = entry.ttl.max(0) as u64;
                                cache.put(entry.key, entry.value, ttl);
                            }
                            OpType::Remove => cache.remove(&entry.key),
                        }
                        applied += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping corrupt WAL entry");
                }
            }
        }
    }

    tracing::info!(applied, "WAL recovery complete");
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::Wal;
    use crate::entry::LogEntry;

    #[test]
    fn missing_wal_file_yields_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.log");
        let cache = Cache::new(4).unwrap();
        let applied = recover_from_wal(&path, "node-a", &cache).unwrap();
        assert_eq!(applied, 0);
        assert!(cache.empty());
    }

    #[test]
    fn filters_by_node_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let wal = Wal::open(&path).unwrap();
        wal.write_batch("node-a", &[LogEntry::put("node-a", "k", "v", 3600, 1)])
            .unwrap();
        wal.write_batch("node-b", &[LogEntry::put("node-b", "k2", "v2", 3600, 1)])
            .unwrap();

        let cache = Cache::new(4).unwrap();
        let applied = recover_from_wal(&path, "node-a", &cache).unwrap();

        assert_eq!(applied, 1);
        assert_eq!(cache.get("k"), Some("v".to_string()));
        assert_eq!(cache.get("k2"), None);
    }

    #[test]
    fn filters_expired_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let wal = Wal::open(&path).unwrap();
        wal.write_batch("node-a", &[LogEntry::put("node-a", "k", "v", 0, 1)])
            .unwrap();

        // sleep past the zero-second ttl so the entry is expired at replay time
        std::thread::sleep(std::time::Duration::from_millis(5));

        let cache = Cache::new(4).unwrap();
        let applied = recover_from_wal(&path, "node-a", &cache).unwrap();
        assert_eq!(applied, 0);
        assert!(cache.empty());
    }

    #[test]
    fn remove_after_put_leaves_key_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
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

        let cache = Cache::new(4).unwrap();
        let applied = recover_from_wal(&path, "node-a", &cache).unwrap();

        assert_eq!(applied, 3);
        assert_eq!(cache.get("k1"), None);
        assert_eq!(cache.get("k2"), Some("v2".to_string()));
    }

    #[test]
    fn corrupt_entry_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
        {
            let wal = Wal::open(&path).unwrap();
            wal.write_batch("node-a", &[LogEntry::put("node-a", "k1", "v1", 3600, 1)])
                .unwrap();
        }
        // flip a bit inside the single entry's payload bytes, after the
        // batch count (4) and length prefix (4) header.
        let mut bytes = std::fs::read(&path).unwrap();
        let flip_at = bytes.len() - 6;
        bytes[flip_at] ^= 0xFF;
        std::fs::write(&path, bytes).unwrap();

        let cache = Cache::new(4).unwrap();
        let applied = recover_from_wal(&path, "node-a", &cache).unwrap();
        assert_eq!(applied, 0);
        assert!(cache.empty());
    }
}
