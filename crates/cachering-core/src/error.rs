//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Error)]
pub enum Error {
    /// A node identifier was empty or otherwise invalid.
    #[error("invalid node id: {0}")]
    InvalidNode(String),

    /// The ring has no members to route a key to.
    #[error("ring has no responsible nodes")]
    NoResponsibleNodes,

    /// The cache was constructed with an invalid capacity.
    #[error("invalid cache capacity: {0}")]
    InvalidCapacity(String),
}
