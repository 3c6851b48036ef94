//! Node identity.
//!
//! A `NodeId` is an opaque, non-empty string identifying a node — typically
//! its network address. It is used both as the ring's virtual-node label
//! and as the owner tag stamped on every WAL entry (§3).

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Compact, cheaply-cloneable identifier for a node in the cluster.
///
/// Newtype over `Arc<str>` so clones are a refcount bump rather than a
/// string copy — `NodeId` is stored once per virtual node on the ring and
/// once per in-flight log entry, so cheap cloning matters.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(Arc<str>);

impl NodeId {
    /// Builds a `NodeId` from any string-like value.
    ///
    /// Returns `Error::InvalidNode` if the value is empty — node ids are
    /// meant to be addresses, and an empty address can never be dialed.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidNode("node id must not be empty".into()));
        }
        Ok(Self(Arc::from(id)))
    }

    /// Borrows the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_id() {
        assert!(NodeId::new("").is_err());
    }

    #[test]
    fn clone_is_cheap_and_equal() {
        let a = NodeId::new("10.0.0.1:9000").unwrap();
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "10.0.0.1:9000");
    }
}
