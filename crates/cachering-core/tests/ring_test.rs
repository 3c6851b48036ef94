//! Integration tests for the hash ring, covering the testable properties
//! of spec §8: replica distinctness, replica coverage, and ring stability.

use cachering_core::node_id::NodeId;
use cachering_core::ring::Ring;
use proptest::prelude::*;

fn id(s: &str) -> NodeId {
    NodeId::new(s).unwrap()
}

#[test]
fn empty_ring_lookup() {
    let ring = Ring::new(4);
    assert_eq!(ring.replicas(b"key1", 3), Vec::new());
    assert_eq!(ring.node_count(), 0);
    assert_eq!(ring.slot_count(), 0);
}

#[test]
fn add_node_and_lookup() {
    let ring = Ring::new(4);
    ring.add_node(id("node1"));

    assert_eq!(ring.node_count(), 1);
    assert_eq!(ring.slot_count(), 4);
    assert_eq!(ring.replicas(b"test-key", 1), vec![id("node1")]);
}

#[test]
fn remove_node_shrinks_ring() {
    let ring = Ring::new(4);
    ring.add_node(id("node1"));
    ring.add_node(id("node2"));
    assert_eq!(ring.node_count(), 2);
    assert_eq!(ring.slot_count(), 8);

    assert!(ring.remove_node(&id("node1")));
    assert_eq!(ring.node_count(), 1);
    assert_eq!(ring.slot_count(), 4);
    assert_eq!(ring.replicas(b"any-key", 1), vec![id("node2")]);
    assert!(!ring.remove_node(&id("node999")));
}

#[test]
fn three_node_replica_set_is_distinct_and_complete() {
    let ring = Ring::new(12);
    ring.add_node(id("a"));
    ring.add_node(id("b"));
    ring.add_node(id("c"));

    let replicas = ring.replicas(b"k", 3);
    assert_eq!(replicas.len(), 3);
    let unique: std::collections::HashSet<_> = replicas.iter().collect();
    assert_eq!(unique.len(), 3);
}

proptest! {
    /// Ring stability (§8): add_node(x); remove_node(x) restores the prior
    /// replica assignment for every key we sample.
    #[test]
    fn ring_stability(seed_keys in proptest::collection::vec("[a-z0-9]{1,12}", 1..20)) {
        let ring = Ring::new(16);
        ring.add_node(id("alpha"));
        ring.add_node(id("beta"));

        let before: Vec<_> = seed_keys
            .iter()
            .map(|k| ring.replicas(k.as_bytes(), 2))
            .collect();

        ring.add_node(id("gamma"));
        ring.remove_node(&id("gamma"));

        let after: Vec<_> = seed_keys
            .iter()
            .map(|k| ring.replicas(k.as_bytes(), 2))
            .collect();

        prop_assert_eq!(before, after);
    }

    /// Replica distinctness (§8): replicas(k, r) never duplicates a node id
    /// and never returns more than r of them.
    #[test]
    fn replica_distinctness(key in "[a-z0-9]{1,16}", r in 0usize..6) {
        let ring = Ring::new(8);
        for n in ["n1", "n2", "n3", "n4"] {
            ring.add_node(id(n));
        }
        let replicas = ring.replicas(key.as_bytes(), r);
        prop_assert!(replicas.len() <= r);
        let unique: std::collections::HashSet<_> = replicas.iter().collect();
        prop_assert_eq!(unique.len(), replicas.len());
    }
}
