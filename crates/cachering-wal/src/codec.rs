//! Deterministic, checksummed binary encoding for a single [`LogEntry`]
//! (§6 WAL file layout, payload section).
//!
//! The wire layout is pinned to the byte by spec §6, so this is a
//! hand-rolled frame rather than a `serde`/`bincode` blob: every field is
//! written in a fixed order, little-endian, with variable-length fields
//! (key, value, node_id) prefixed by a `u32` length. The trailing
//! `u32` checksum is a CRC-32 (`crc32fast`, the idiomatic-Rust analogue of
//! the original's `boost::crc_32_type`) computed over every byte that
//! precedes it — equivalent to "CRC-32 of the payload with the checksum
//! field cleared" since the field simply doesn't exist yet at the point
//! the checksum is computed.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

use crate::entry::{LogEntry, OpType};
use crate::error::{Error, Result};

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    let mut len_bytes = [0u8; 4];
    LittleEndian::write_u32(&mut len_bytes, bytes.len() as u32);
    buf.extend_from_slice(&len_bytes);
    buf.extend_from_slice(bytes);
}

fn read_bytes(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| Error::Corrupt(format!("truncated length prefix: {e}")))? as usize;
    let mut buf = vec![0u8; len];
    cursor
        .read_exact(&mut buf)
        .map_err(|e| Error::Corrupt(format!("truncated byte field: {e}")))?;
    Ok(buf)
}

/// Serializes `entry` for persistence under the given batch `node_id`
/// (§4.3 `serialize_entry`). The batch's `node_id` is what is written to
/// disk — matching the original's `WAL::serializeEntry(node_id, entry)`,
/// which always stamps the batch owner rather than trusting any node_id
/// the entry itself might carry.
pub fn serialize_entry(node_id: &str, entry: &LogEntry) -> Vec<u8> {
    let mut buf = Vec::new();

    let mut seq_bytes = [0u8; 8];
    LittleEndian::write_u64(&mut seq_bytes, entry.sequence_number);
    buf.extend_from_slice(&seq_bytes);

    buf.push(entry.op_type as u8);

    write_bytes(&mut buf, entry.key.as_bytes());
    write_bytes(&mut buf, entry.value.as_bytes());

    let mut ttl_bytes = [0u8; 8];
    LittleEndian::write_i64(&mut ttl_bytes, entry.ttl);
    buf.extend_from_slice(&ttl_bytes);

    let mut ts_bytes = [0u8; 8];
    LittleEndian::write_i64(&mut ts_bytes, entry.timestamp);
    buf.extend_from_slice(&ts_bytes);

    write_bytes(&mut buf, node_id.as_bytes());

    let checksum = crc32fast::hash(&buf);
    let mut checksum_bytes = [0u8; 4];
    LittleEndian::write_u32(&mut checksum_bytes, checksum);
    buf.extend_from_slice(&checksum_bytes);

    buf
}

/// Parses and checksum-verifies a serialized entry (§4.3
/// `deserialize_entry`). Returns `Error::Corrupt` on a checksum mismatch
/// or a truncated/malformed frame.
pub fn deserialize_entry(bytes: &[u8]) -> Result<LogEntry> {
    if bytes.len() < 4 {
        return Err(Error::Corrupt("frame shorter than checksum field".into()));
    }
    let (fields, checksum_bytes) = bytes.split_at(bytes.len() - 4);
    let stored_checksum = LittleEndian::read_u32(checksum_bytes);
    let computed_checksum = crc32fast::hash(fields);
    if stored_checksum != computed_checksum {
        return Err(Error::Corrupt(format!(
            "checksum mismatch: stored {stored_checksum:#010x}, computed {computed_checksum:#010x}"
        )));
    }

    let mut cursor = Cursor::new(fields);
    let sequence_number = cursor
        .read_u64::<LittleEndian>()
        .map_err(|e| Error::Corrupt(format!("truncated sequence number: {e}")))?;
    let op_byte = cursor
        .read_u8()
        .map_err(|e| Error::Corrupt(format!("truncated op type: {e}")))?;
    let op_type = OpType::from_u8(op_byte)
        .ok_or_else(|| Error::Corrupt(format!("unknown op type byte {op_byte}")))?;
    let key = String::from_utf8(read_bytes(&mut cursor)?)
        .map_err(|e| Error::Corrupt(format!("key is not utf-8: {e}")))?;
    let value = String::from_utf8(read_bytes(&mut cursor)?)
        .map_err(|e| Error::Corrupt(format!("value is not utf-8: {e}")))?;
    let ttl = cursor
        .read_i64::<LittleEndian>()
        .map_err(|e| Error::Corrupt(format!("truncated ttl: {e}")))?;
    let timestamp = cursor
        .read_i64::<LittleEndian>()
        .map_err(|e| Error::Corrupt(format!("truncated timestamp: {e}")))?;
    let node_id = String::from_utf8(read_bytes(&mut cursor)?)
        .map_err(|e| Error::Corrupt(format!("node_id is not utf-8: {e}")))?;

    Ok(LogEntry {
        op_type,
        node_id,
        key,
        value,
        ttl,
        timestamp,
        sequence_number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_field() {
        let entry = LogEntry::put("node-a", "key", "value", 60, 7);
        let bytes = serialize_entry("node-a", &entry);
        let decoded = deserialize_entry(&bytes).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn remove_entry_round_trips() {
        let entry = LogEntry::remove("node-a", "key", 9);
        let bytes = serialize_entry("node-a", &entry);
        let decoded = deserialize_entry(&bytes).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn bit_flip_is_detected_as_corruption() {
        let entry = LogEntry::put("node-a", "key", "value", 60, 1);
        let mut bytes = serialize_entry("node-a", &entry);
        let flip_idx = bytes.len() / 2;
        bytes[flip_idx] ^= 0x01;
        assert!(deserialize_entry(&bytes).is_err());
    }

    #[test]
    fn truncated_frame_is_corruption_not_panic() {
        let entry = LogEntry::put("node-a", "key", "value", 60, 1);
        let bytes = serialize_entry("node-a", &entry);
        let truncated = &bytes[..bytes.len() - 2];
        assert!(deserialize_entry(truncated).is_err());
    }
}
