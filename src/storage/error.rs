use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("remote storage operation failed: {0}")]
    Remote(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    #[error("storage task failed: {0}")]
    TaskFailed(String),

    #[error("invalid storage target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },
}

pub type StorageResult<T> = Result<T, StorageError>;
