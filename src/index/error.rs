use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum IndexError {
    /// Persisted blob could not be decoded into a valid index. The index must be rebuilt.
    #[error("index is corrupt: {reason}")]
    Corrupt { reason: String },

    /// No index has been persisted at this location yet.
    #[error("no index found at {location}")]
    NotFound { location: String },

    #[error("record {id} has embedding dimension {actual}, index dimension is {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate requirement id: {id}")]
    DuplicateId { id: String },

    #[error("invalid record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("index serialization failed: {0}")]
    Serialization(String),

    #[error("index storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type IndexResult<T> = Result<T, IndexError>;
