//! Node-level error kinds (§7), each one mapped to a `tonic::Status` at
//! the service boundary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Kind 1: no node is responsible for this key — the ring is empty.
    #[error("no responsible nodes for this key")]
    NoResponsibleNodes,

    /// Kind 2: key absent locally when this node is responsible.
    #[error("key not found")]
    NotFound,

    /// Kind 3: forwarding or replication RPC to a peer failed.
    #[error("transport failure contacting {peer}: {source}")]
    Transport {
        peer: String,
        #[source]
        source: tonic::Status,
    },

    #[error(transparent)]
    Core(#[from] cachering_core::Error),

    #[error(transparent)]
    Replication(#[from] cachering_replication::Error),

    /// Kind 5/6: the WAL could not be opened or read at startup — fatal.
    #[error(transparent)]
    Wal(#[from] cachering_wal::Error),

    /// The node's own address is not a dialable socket address.
    #[error("node address {0} is not a valid socket address")]
    InvalidAddress(String),
}

impl From<Error> for tonic::Status {
    fn from(err: Error) -> Self {
        match err {
            Error::NoResponsibleNodes => tonic::Status::internal(err.to_string()),
            Error::NotFound => tonic::Status::not_found(err.to_string()),
            Error::Transport { source, .. } => source,
            Error::Core(_) | Error::Replication(_) | Error::Wal(_) | Error::InvalidAddress(_) => {
                tonic::Status::internal(err.to_string())
            }
        }
    }
}
