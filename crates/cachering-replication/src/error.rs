use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The ring has no members at all, so no replica set can be formed
    /// (§4.6 Put handler: "if R is empty return INTERNAL").
    #[error("no replica nodes available for this key")]
    NoReplicas,
}
