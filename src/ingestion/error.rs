use std::path::PathBuf;

use thiserror::Error;

use super::document::DocumentType;
use crate::embedding::EmbeddingError;
use crate::llm::LlmError;
use crate::record::PoolError;
use crate::retry::{RetryableError, TimedOut};

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {kind} documents are not supported, convert to text or Markdown first")]
    UnsupportedDocumentType { path: PathBuf, kind: DocumentType },

    #[error("{source_document} is not valid UTF-8 text")]
    InvalidEncoding { source_document: String },

    #[error("normalization of {source_document} failed: {reason}")]
    Normalization {
        source_document: String,
        reason: String,
    },

    #[error("embedding failed for {source_document}: {error}")]
    Embedding {
        source_document: String,
        #[source]
        error: EmbeddingError,
    },

    #[error("collaborator call timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("invalid candidate pool: {0}")]
    Pool(#[from] PoolError),
}

impl From<TimedOut> for IngestionError {
    fn from(err: TimedOut) -> Self {
        IngestionError::Timeout {
            ms: err.after.as_millis() as u64,
        }
    }
}

impl From<LlmError> for IngestionError {
    fn from(err: LlmError) -> Self {
        IngestionError::Normalization {
            source_document: String::new(),
            reason: err.to_string(),
        }
    }
}

impl RetryableError for IngestionError {
    fn is_retryable(&self) -> bool {
        match self {
            IngestionError::Normalization { .. } | IngestionError::Timeout { .. } => true,
            IngestionError::Embedding { error, .. } => error.is_retryable(),
            _ => false,
        }
    }
}

pub type IngestionResult<T> = Result<T, IngestionError>;
