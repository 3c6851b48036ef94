//! Error types for the write-ahead log and its consumers.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Opening the WAL file failed — fatal per §4.3 / §7 kind 2.
    #[error("failed to open WAL file at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A write (length prefix, payload, or flush) did not fully land.
    #[error("WAL write failed: {0}")]
    Write(std::io::Error),

    /// A record's checksum did not match its payload, or the record could
    /// not be parsed — §7 kind 5, non-fatal, the entry is skipped.
    #[error("WAL entry corrupted: {0}")]
    Corrupt(String),

    /// An I/O error before any successful read during recovery — fatal.
    #[error("failed to read WAL file: {0}")]
    Read(std::io::Error),
}
