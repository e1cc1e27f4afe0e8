//! Configuration error types.

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Variable is set but does not parse as the expected number.
    #[error("failed to parse {name}='{value}': {reason}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Value parsed but violates an invariant.
    #[error("invalid {name} = {value}: {reason}")]
    OutOfRange {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{name} must not be empty")]
    Empty { name: &'static str },
}
