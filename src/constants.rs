//! Cross-cutting, shared constants.
//!
//! Matcher and adjudication defaults are tuning parameters, not correctness requirements.
//! They are deliberately conservative: a low similarity threshold keeps borderline
//! statements in front of the judge instead of reporting them as missing.
//!
//! # Dimension Invariants
//!
//! Every embedding stored in a [`RequirementIndex`](crate::index::RequirementIndex) shares one
//! dimensionality, established by the first record ever appended. Use
//! [`validate_embedding_dim`] at module boundaries (index append, candidate pool construction,
//! embedder responses) to catch mismatches before any similarity is computed.

use std::time::Duration;

/// Default number of candidate statements kept per requirement.
pub const DEFAULT_TOP_K: usize = 3;

/// Default minimum cosine similarity for a statement to be considered related.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.30;

/// Default number of requirements matched and adjudicated concurrently.
pub const DEFAULT_PARALLELISM: usize = 4;

/// Default dimensionality of the offline hashing embedder.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// Default per-call timeout for external collaborators (embedding, judgment, storage).
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Default number of attempts (first call included) for a collaborator call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;

/// Upper bound on a single retry delay.
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Default object/file name of the persisted requirement index.
pub const DEFAULT_INDEX_FILENAME: &str = "reference_index.json";

/// Version tag written into every persisted index blob.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Longest text (in characters) accepted by the built-in embedders.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 8192;

/// Characters of matched statement text shown per evidence line in rendered reports.
pub const MAX_EVIDENCE_CHARS: usize = 200;

/// Justification recorded when no candidate statement survives the similarity threshold.
pub const MISSING_JUSTIFICATION: &str = "no semantically related statement found in target document";

/// Justification recorded when the judge could not be reached after all retries.
pub const DEGRADED_JUSTIFICATION: &str =
    "adjudication unavailable; matched text found but not validated";

/// Justification recorded for requirements abandoned by a cancelled run.
pub const CANCELLED_JUSTIFICATION: &str = "verification run cancelled before this requirement was checked";

/// Error returned when dimension validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// # Example
///
/// ```
/// use sopcheck::constants::validate_embedding_dim;
///
/// validate_embedding_dim(384, 384).unwrap();
/// assert!(validate_embedding_dim(768, 384).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if actual == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
