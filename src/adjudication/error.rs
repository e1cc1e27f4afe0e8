use thiserror::Error;

use crate::llm::LlmError;
use crate::retry::{RetryableError, TimedOut};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdjudicationError {
    #[error("judge request failed: {reason}")]
    Request { reason: String },

    #[error("judge call timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("judge response could not be parsed: {reason}")]
    UnparseableResponse { reason: String },

    /// The judge answered with a label outside SATISFIED / PARTIAL / WEAK.
    #[error("judge returned out-of-taxonomy classification {label:?}")]
    UnknownClassification { label: String },
}

impl From<TimedOut> for AdjudicationError {
    fn from(err: TimedOut) -> Self {
        AdjudicationError::Timeout {
            ms: err.after.as_millis() as u64,
        }
    }
}

impl From<LlmError> for AdjudicationError {
    fn from(err: LlmError) -> Self {
        AdjudicationError::Request {
            reason: err.to_string(),
        }
    }
}

// Model output varies between calls, so even parse failures are worth another attempt.
impl RetryableError for AdjudicationError {}
