//! TTL'd LRU cache (§4.2).
//!
//! Grounded in `examples/original_source/lru.h`: a hash index mapping keys
//! to a position in a recency list, most-recent at the head, with eviction
//! of the tail on capacity overflow. The original ties the index directly
//! to `std::list<CacheItem>::iterator`s — a cyclic, alias-heavy
//! relationship that doesn't translate to safe Rust (REDESIGN FLAGS §9).
//! Here the list is a slab arena (`Vec<Option<Entry>>` plus a free list) and
//! the index stores stable `usize` handles into it, giving the same O(1)
//! unlink-by-handle the original gets from list iterators, without unsafe
//! code or a second ownership path into the same nodes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{Error, Result};

struct Entry {
    key: String,
    value: String,
    expiry: Instant,
    prev: Option<usize>,
    next: Option<usize>,
}

struct CacheState {
    index: HashMap<String, usize>,
    arena: Vec<Option<Entry>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl CacheState {
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let e = self.arena[idx].as_ref().unwrap();
            (e.prev, e.next)
        };
        match prev {
            Some(p) => self.arena[p].as_mut().unwrap().next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.arena[n].as_mut().unwrap().prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let e = self.arena[idx].as_mut().unwrap();
            e.prev = None;
            e.next = old_head;
        }
        if let Some(h) = old_head {
            self.arena[h].as_mut().unwrap().prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn touch(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.push_front(idx);
    }

    fn alloc(&mut self, entry: Entry) -> usize {
        if let Some(idx) = self.free.pop() {
            self.arena[idx] = Some(entry);
            idx
        } else {
            self.arena.push(Some(entry));
            self.arena.len() - 1
        }
    }

    fn evict(&mut self, idx: usize) {
        self.detach(idx);
        let entry = self.arena[idx].take().expect("evicted slot occupied");
        self.index.remove(&entry.key);
        self.free.push(idx);
    }
}

/// A TTL/LRU-evicting string -> string cache, one mutex guarding both the
/// index and the recency list (§5 — the background expiry task and request
/// handlers both acquire the same lock, never two different ones).
pub struct Cache {
    state: Mutex<CacheState>,
    capacity: usize,
}

impl Cache {
    /// Builds a cache with room for `capacity` entries. `capacity` must be
    /// greater than zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity("capacity must be > 0".into()));
        }
        Ok(Self {
            state: Mutex::new(CacheState {
                index: HashMap::new(),
                arena: Vec::new(),
                free: Vec::new(),
                head: None,
                tail: None,
            }),
            capacity,
        })
    }

    /// Looks up `key`, promoting it to most-recently-used on a hit.
    ///
    /// Deliberately does not check expiry — an expired entry remains
    /// gettable until the background sweep removes it (§4.2, §9 flag 2).
    /// Callers that need a tighter read can pair this with their own
    /// expiry check; the node coordinator does not, matching the original.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut state = self.state.lock();
        let idx = *state.index.get(key)?;
        state.touch(idx);
        Some(state.arena[idx].as_ref().unwrap().value.clone())
    }

    /// Inserts or overwrites `key`, setting its expiry to `now + ttl`.
    /// Evicts the least-recently-used entry iff this insert pushed the
    /// cache over capacity.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>, ttl_seconds: u64) {
        let key = key.into();
        let expiry = Instant::now() + Duration::from_secs(ttl_seconds);
        let mut state = self.state.lock();

        if let Some(&idx) = state.index.get(&key) {
            {
                let e = state.arena[idx].as_mut().unwrap();
                e.value = value.into();
                e.expiry = expiry;
            }
            state.touch(idx);
            return;
        }

        let idx = state.alloc(Entry {
            key: key.clone(),
            value: value.into(),
            expiry,
            prev: None,
            next: None,
        });
        state.index.insert(key, idx);
        state.push_front(idx);

        if state.index.len() > self.capacity {
            if let Some(tail) = state.tail {
                state.evict(tail);
            }
        }
    }

    /// Removes `key` if present. A remove is not a "use" and does not
    /// affect the recency order of other entries (§4.2).
    pub fn remove(&self, key: &str) {
        let mut state = self.state.lock();
        if let Some(idx) = state.index.get(key).copied() {
            state.evict(idx);
        }
    }

    /// Number of entries currently stored (including not-yet-swept expired
    /// ones).
    pub fn size(&self) -> usize {
        self.state.lock().index.len()
    }

    /// True iff the cache holds no entries.
    pub fn empty(&self) -> bool {
        self.state.lock().index.is_empty()
    }

    /// Removes every entry whose expiry has passed. Run once per tick by
    /// the node's background expiry task (§4.2); takes the lock for the
    /// full sweep and releases it before the caller sleeps, so the lock is
    /// never held across a `sleep` (§9 flag 2).
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let mut state = self.state.lock();
        let mut removed = 0;
        let mut cursor = state.head;
        while let Some(idx) = cursor {
            let next = state.arena[idx].as_ref().unwrap().next;
            if state.arena[idx].as_ref().unwrap().expiry <= now {
                state.evict(idx);
                removed += 1;
            }
            cursor = next;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn rejects_zero_capacity() {
        assert!(Cache::new(0).is_err());
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = Cache::new(4).unwrap();
        cache.put("k", "v", 60);
        assert_eq!(cache.get("k"), Some("v".to_string()));
    }

    #[test]
    fn remove_then_get_misses() {
        let cache = Cache::new(4).unwrap();
        cache.put("k", "v", 60);
        cache.remove("k");
        assert_eq!(cache.get("k"), None);
        // removing an absent key is not an error
        cache.remove("k");
    }

    #[test]
    fn lru_eviction_on_overflow() {
        // Scenario 5 from spec §8: capacity 2, put a, put b, get a, put c
        // -> {"a", "c"} present, "b" evicted.
        let cache = Cache::new(2).unwrap();
        cache.put("a", "1", 60);
        cache.put("b", "2", 60);
        cache.get("a");
        cache.put("c", "3", 60);

        assert_eq!(cache.get("a"), Some("1".to_string()));
        assert_eq!(cache.get("c"), Some("3".to_string()));
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn overwrite_does_not_grow_size() {
        let cache = Cache::new(2).unwrap();
        cache.put("a", "1", 60);
        cache.put("a", "2", 60);
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get("a"), Some("2".to_string()));
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let cache = Cache::new(4).unwrap();
        cache.put("soon", "v", 0);
        cache.put("later", "v", 60);

        sleep(Duration::from_millis(5));
        let removed = cache.sweep_expired(Instant::now());

        assert_eq!(removed, 1);
        assert_eq!(cache.get("soon"), None);
        assert_eq!(cache.get("later"), Some("v".to_string()));
    }

    #[test]
    fn empty_reports_correctly() {
        let cache = Cache::new(2).unwrap();
        assert!(cache.empty());
        cache.put("a", "1", 60);
        assert!(!cache.empty());
    }
}
