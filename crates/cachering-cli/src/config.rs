//! Command-line configuration (§6 CLI contract, expanded with the §6
//! configuration defaults exposed as flags).
//!
//! Grounded in `examples/original_source/main.cpp`'s `<address> <peer1>
//! [<peer2> ...]` usage line, re-expressed with `clap` derive the way
//! `examples/ThomasGraceman-consistent-hashing`'s own `cli` crate already
//! depends on `clap` for its commands.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use cachering_node::node::{
    NodeConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_REPLICATION_FACTOR,
};
use cachering_node::node::DEFAULT_VIRTUAL_NODES as _DEFAULT_VIRTUAL_NODES;
use cachering_wal::write_queue::{DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL};

/// Starts a cache node listening at `address`, aware of the given peers.
#[derive(Debug, Parser)]
#[command(name = "cachering-node", version, about)]
pub struct Cli {
    /// This node's own address, e.g. 127.0.0.1:9000.
    pub address: String,

    /// Addresses of the other nodes in the cluster. At least one is
    /// required, matching `main.cpp`'s `argc < 3` check.
    #[arg(required = true, num_args = 1..)]
    pub peers: Vec<String>,

    /// Maximum number of entries the local cache holds.
    #[arg(long, default_value_t = DEFAULT_CACHE_CAPACITY)]
    pub capacity: usize,

    /// Path to this node's write-ahead log file.
    #[arg(long, default_value = "wal.log")]
    pub wal_path: PathBuf,

    /// Number of nodes that should hold a copy of each key.
    #[arg(long, default_value_t = DEFAULT_REPLICATION_FACTOR)]
    pub replication_factor: usize,

    /// Entries per WAL batch before a size-triggered flush.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Seconds between time-triggered flushes.
    #[arg(long, default_value_t = DEFAULT_FLUSH_INTERVAL.as_secs())]
    pub flush_interval_secs: u64,

    /// Increase log verbosity; repeat for more (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn into_node_config(self) -> NodeConfig {
        NodeConfig {
            address: self.address,
            peers: self.peers,
            cache_capacity: self.capacity,
            wal_path: self.wal_path,
            replication_factor: self.replication_factor,
            batch_size: self.batch_size,
            flush_interval: Duration::from_secs(self.flush_interval_secs),
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
