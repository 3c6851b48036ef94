//! Deterministic 64-bit hashing over byte strings.
//!
//! The ring needs a hash that is stable across process restarts and across
//! nodes — `std::collections::hash_map::DefaultHasher` is randomly seeded
//! per-process and would violate the "ring stability" invariant (§8), so
//! we standardize on `xxh3_64`, already a declared dependency of this
//! workspace's hashing stack.

use xxhash_rust::xxh3::xxh3_64;

/// Hashes a byte string into a 64-bit ring slot.
pub fn slot(bytes: &[u8]) -> u64 {
    xxh3_64(bytes)
}
