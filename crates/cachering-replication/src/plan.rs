//! Turns a ring's replica set into a concrete plan for one node to act on
//! (§4.6 Get/Put/Remove handlers).
//!
//! Grounded in `examples/ThomasGraceman-consistent-hashing`'s
//! `replication::strategy::simple::SimpleStrategy`: that strategy returns
//! a "primary first" `Vec<NodeId>` from a ring lookup; `Plan` picks up
//! exactly there; the placement policy it replaces the teacher's
//! `NetworkTopologyStrategy` (rack/DC-aware placement, never implemented
//! by the request this is built from, out of scope here) and
//! `ConsistencyLevel` (quorum reads/writes, an explicit non-goal).

use cachering_core::NodeId;

use crate::error::{Error, Result};

/// What a single node should do with a request for a given key, derived
/// from `Ring::replicas(key, r)` and this node's own identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// This node is not a member of the replica set; forward verbatim to
    /// the given primary (the first entry of the replica set).
    Forward { primary: NodeId },
    /// This node is a member of the replica set. `fanout` holds every
    /// other member, to be replicated to after a local apply.
    Local { fanout: Vec<NodeId> },
}

impl Plan {
    /// Builds a plan for `self_id` given the replica set `replicas`
    /// returned by the ring (primary-first, per §3 `ReplicaSet`).
    ///
    /// Returns `Error::NoReplicas` iff the replica set is empty, which
    /// only happens when the ring itself has no members.
    pub fn build(replicas: &[NodeId], self_id: &NodeId) -> Result<Self> {
        let primary = replicas.first().cloned().ok_or(Error::NoReplicas)?;

        if !replicas.contains(self_id) {
            return Ok(Plan::Forward { primary });
        }

        let fanout = replicas
            .iter()
            .filter(|n| *n != self_id)
            .cloned()
            .collect();
        Ok(Plan::Local { fanout })
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Plan::Local { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::new(s).unwrap()
    }

    #[test]
    fn empty_replica_set_is_an_error() {
        let err = Plan::build(&[], &id("a")).unwrap_err();
        assert!(matches!(err, Error::NoReplicas));
    }

    #[test]
    fn member_node_gets_fanout_excluding_itself() {
        let replicas = vec![id("a"), id("b"), id("c")];
        let plan = Plan::build(&replicas, &id("b")).unwrap();
        match plan {
            Plan::Local { fanout } => assert_eq!(fanout, vec![id("a"), id("c")]),
            _ => panic!("expected Local"),
        }
    }

    #[test]
    fn non_member_forwards_to_primary() {
        let replicas = vec![id("a"), id("b")];
        let plan = Plan::build(&replicas, &id("z")).unwrap();
        assert_eq!(plan, Plan::Forward { primary: id("a") });
    }

    #[test]
    fn sole_replica_gets_empty_fanout() {
        let replicas = vec![id("a")];
        let plan = Plan::build(&replicas, &id("a")).unwrap();
        assert_eq!(plan, Plan::Local { fanout: vec![] });
    }
}
