use thiserror::Error;

use super::state::RunState;
use crate::index::IndexError;
use crate::ingestion::IngestionError;
use crate::matching::MatchingError;

/// Fatal run failures. Per-requirement problems never surface here; they become findings.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Matcher(#[from] MatchingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error("target embeddings have dimension {pool}, index dimension is {index}")]
    DimensionMismatch { index: usize, pool: usize },

    #[error("run cancelled during {state}")]
    Cancelled { state: RunState },

    #[error("invalid run state transition {from} -> {to}")]
    InvalidTransition { from: RunState, to: RunState },
}

pub type RunResult<T> = Result<T, RunError>;
