//! Consistent-hash ring with virtual nodes (§4.1, data model §3).
//!
//! Grounded in `examples/original_source/consistent_hash.{h,cpp}`: a mutex
//! guarded sorted map from hash slot to node id, virtual nodes labelled
//! `"{node_id}#{i}"`, and a clockwise walk from `hash(key)` that folds back
//! to the start of the map when it runs off the end. The teacher's
//! `corelib::ring` module sketched the same `BTreeMap<Token, NodeId>` shape
//! in a doc comment (`ring/ring.rs`) without ever filling it in; this is
//! that sketch, completed and generalized to a concrete 64-bit token space.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::hash::slot;
use crate::node_id::NodeId;

/// Default virtual nodes per physical node (§6 configuration defaults).
pub const DEFAULT_VIRTUAL_NODES: usize = 52;

struct RingState {
    /// Sorted slot -> owning node. Ties between virtual labels of
    /// different nodes are resolved by last writer, per §4.1.
    slots: BTreeMap<u64, NodeId>,
    /// Physical membership, tracked independently of `slots` so
    /// `node_count` is correct even under virtual-node collisions.
    members: Vec<NodeId>,
}

/// The consistent-hash ring. Cheap to clone (wraps a single mutex behind
/// no indirection is not provided — callers share a `Ring` via `Arc`, the
/// same way `Node` owns its ring for the whole process lifetime, per §3).
pub struct Ring {
    state: Mutex<RingState>,
    virtual_nodes: usize,
}

impl Ring {
    /// Builds an empty ring with `virtual_nodes` virtual entries per
    /// physical node added later via [`Ring::add_node`].
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            state: Mutex::new(RingState {
                slots: BTreeMap::new(),
                members: Vec::new(),
            }),
            virtual_nodes,
        }
    }

    /// Builds a ring using the reference configuration's virtual node
    /// count (§6).
    pub fn with_default_vnodes() -> Self {
        Self::new(DEFAULT_VIRTUAL_NODES)
    }

    fn vnode_labels(&self, id: &NodeId) -> impl Iterator<Item = String> + '_ {
        let id = id.as_str().to_string();
        (0..self.virtual_nodes).map(move |i| format!("{id}#{i}"))
    }

    /// Inserts `virtual_nodes` virtual entries for `id`. Idempotent: the
    /// same id hashes to the same slots every time, so re-adding it is a
    /// no-op write of identical values (§4.1).
    pub fn add_node(&self, id: NodeId) {
        let mut state = self.state.lock();
        for label in self.vnode_labels(&id) {
            let h = slot(label.as_bytes());
            state.slots.insert(h, id.clone());
        }
        if !state.members.contains(&id) {
            state.members.push(id);
        }
    }

    /// Erases `id`'s virtual entries. Missing slots (e.g. because another
    /// node's vnode collided and overwrote them) are tolerated — erasing a
    /// slot that already belongs to someone else, or doesn't exist, is a
    /// no-op for that slot.
    pub fn remove_node(&self, id: &NodeId) -> bool {
        let mut state = self.state.lock();
        let was_member = state.members.iter().any(|m| m == id);
        for label in self.vnode_labels(id) {
            let h = slot(label.as_bytes());
            if state.slots.get(&h) == Some(id) {
                state.slots.remove(&h);
            }
        }
        state.members.retain(|m| m != id);
        was_member
    }

    /// Returns the first `r` distinct node ids encountered walking the ring
    /// clockwise from `hash(key)`, wrapping at the end back to the
    /// beginning. If fewer than `r` distinct physical nodes exist, returns
    /// all of them (§3 `ReplicaSet`).
    pub fn replicas(&self, key: &[u8], r: usize) -> Vec<NodeId> {
        if r == 0 {
            return Vec::new();
        }
        let state = self.state.lock();
        if state.slots.is_empty() {
            return Vec::new();
        }
        let h = slot(key);
        let mut replicas: Vec<NodeId> = Vec::with_capacity(r);

        let head = state.slots.range(h..).map(|(_, v)| v);
        let wrap = state.slots.range(..h).map(|(_, v)| v);
        for candidate in head.chain(wrap) {
            if replicas.len() >= r {
                break;
            }
            if !replicas.contains(candidate) {
                replicas.push(candidate.clone());
            }
        }
        replicas
    }

    /// Number of distinct physical nodes currently in the ring.
    pub fn node_count(&self) -> usize {
        self.state.lock().members.len()
    }

    /// Number of virtual-node slots currently occupied (<= `node_count() *
    /// virtual_nodes`, less under collisions).
    pub fn slot_count(&self) -> usize {
        self.state.lock().slots.len()
    }

    /// Lists all physical members, in insertion order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.state.lock().members.clone()
    }
}
