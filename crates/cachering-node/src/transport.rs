//! Peer channel pool (§5 "Peer channel pool: one mutex; cached channels
//! are shared references that may be used by multiple threads
//! concurrently").
//!
//! Grounded in `examples/original_source/node.cpp`'s
//! `getOrCreateChannel`/`channel_pool_`: a `Mutex`-guarded map from peer
//! address to a cached, cloneable channel handle. `tonic::transport::
//! Channel` is itself cheap to clone (it's a handle over a connection
//! pool), so the map stores the channel directly rather than an
//! `Arc<Channel>`, matching the original's `shared_ptr<grpc::Channel>`
//! in spirit if not in exact type.

use std::collections::HashMap;

use parking_lot::Mutex;
use tonic::transport::Channel;

use cachering_core::NodeId;

/// Lazily-connecting, cached set of gRPC channels to peer nodes.
pub struct ChannelPool {
    channels: Mutex<HashMap<NodeId, Channel>>,
}

impl ChannelPool {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached channel for `peer`, creating and caching one if
    /// this is the first time `peer` has been contacted. Connection is
    /// lazy: the returned channel resolves its first connection attempt
    /// on first use, not here.
    pub fn get_or_create(&self, peer: &NodeId) -> Channel {
        if let Some(channel) = self.channels.lock().get(peer) {
            return channel.clone();
        }

        let endpoint = format!("http://{}", peer.as_str());
        let channel = Channel::from_shared(endpoint)
            .expect("peer address must be a valid URI")
            .connect_lazy();

        self.channels.lock().insert(peer.clone(), channel.clone());
        channel
    }
}

impl Default for ChannelPool {
    fn default() -> Self {
        Self::new()
    }
}
