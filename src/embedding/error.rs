use thiserror::Error;

use crate::retry::{RetryableError, TimedOut};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("cannot embed empty text")]
    EmptyInput,

    #[error("input of {chars} characters exceeds the embedder limit of {max}")]
    InputTooLong { chars: usize, max: usize },

    #[error("embedding request failed: {reason}")]
    Request { reason: String },

    #[error("invalid embedding response: {reason}")]
    InvalidResponse { reason: String },

    #[error("embedder returned dimension {actual}, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding call timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("invalid embedder configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EmbeddingError {
    /// The embedder refused this particular text; other texts may still embed.
    pub fn rejects_input(&self) -> bool {
        matches!(
            self,
            EmbeddingError::EmptyInput | EmbeddingError::InputTooLong { .. }
        )
    }
}

impl From<TimedOut> for EmbeddingError {
    fn from(err: TimedOut) -> Self {
        EmbeddingError::Timeout {
            ms: err.after.as_millis() as u64,
        }
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            EmbeddingError::InvalidResponse {
                reason: err.to_string(),
            }
        } else {
            EmbeddingError::Request {
                reason: err.to_string(),
            }
        }
    }
}

impl RetryableError for EmbeddingError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            EmbeddingError::Request { .. } | EmbeddingError::Timeout { .. }
        )
    }
}
