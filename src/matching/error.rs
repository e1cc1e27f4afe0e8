use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MatchingError {
    #[error("top_k must be at least 1")]
    ZeroTopK,

    #[error("similarity threshold {0} is outside [-1, 1]")]
    ThresholdOutOfRange(f32),
}

pub type MatchingResult<T> = Result<T, MatchingError>;
