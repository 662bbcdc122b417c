// Typed errors for the garage store internals.
// Binaries and collaborators wrap these in anyhow at their boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Serializing a collection to JSON failed
    #[error("failed to encode collection: {0}")]
    Encode(#[source] serde_json::Error),

    /// JSON has no representation for NaN or infinity
    #[error("member {member_id} has a non-finite {field}")]
    NonFinite { member_id: uuid::Uuid, field: &'static str },

    /// Persisted payload is not a valid collection
    #[error("failed to decode collection: {0}")]
    Decode(String),

    /// Digest line does not match the payload it guards
    #[error("checksum mismatch: expected {expected}, found {found}")]
    ChecksumMismatch { expected: String, found: String },

    #[error("settings storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Backend refused the write (used by the in-memory backend)
    #[error("write rejected for key '{0}'")]
    WriteRejected(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
