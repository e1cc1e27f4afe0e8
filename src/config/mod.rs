//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SOPCHECK_*` environment variables; CLI flags
//! override both. Numeric variables that fail to parse are errors, not silently defaulted.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::adjudication::AdjudicationPolicy;
use crate::constants::{
    DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_EMBEDDING_DIM, DEFAULT_INDEX_FILENAME,
    DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_PARALLELISM,
    DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K,
};
use crate::matching::MatcherConfig;
use crate::retry::RetryPolicy;

/// Default chat model for adjudication (provider inferred by `genai`).
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-4o-mini";

/// Default model name sent to the HTTP embeddings endpoint.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Run configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Index location: a path, `local`, or `gs://bucket/object`. Default: `reference_index.json`.
    pub index: String,

    /// Candidates kept per requirement. Default: `3`.
    pub top_k: usize,

    /// Minimum cosine similarity. Default: `0.30`.
    pub threshold: f32,

    /// Similarity at which the judge is skipped. Default: disabled.
    pub auto_satisfy_threshold: Option<f32>,

    /// Requirements adjudicated concurrently. Default: `4`.
    pub parallelism: usize,

    pub judge_model: String,

    /// Chat model for reference decomposition; the built-in splitter is used when unset.
    pub normalizer_model: Option<String>,

    /// OpenAI-compatible embeddings URL; the offline hash embedder is used when unset.
    pub embedding_url: Option<String>,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub embedding_dim: usize,

    pub call_timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX_FILENAME.to_string(),
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            auto_satisfy_threshold: None,
            parallelism: DEFAULT_PARALLELISM,
            judge_model: DEFAULT_JUDGE_MODEL.to_string(),
            normalizer_model: None,
            embedding_url: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_api_key: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
        }
    }
}

impl Config {
    const ENV_INDEX: &'static str = "SOPCHECK_INDEX";
    const ENV_TOP_K: &'static str = "SOPCHECK_TOP_K";
    const ENV_THRESHOLD: &'static str = "SOPCHECK_THRESHOLD";
    const ENV_AUTO_SATISFY: &'static str = "SOPCHECK_AUTO_SATISFY_THRESHOLD";
    const ENV_PARALLELISM: &'static str = "SOPCHECK_PARALLELISM";
    const ENV_JUDGE_MODEL: &'static str = "SOPCHECK_JUDGE_MODEL";
    const ENV_NORMALIZER_MODEL: &'static str = "SOPCHECK_NORMALIZER_MODEL";
    const ENV_EMBEDDING_URL: &'static str = "SOPCHECK_EMBEDDING_URL";
    const ENV_EMBEDDING_MODEL: &'static str = "SOPCHECK_EMBEDDING_MODEL";
    const ENV_EMBEDDING_API_KEY: &'static str = "SOPCHECK_EMBEDDING_API_KEY";
    const ENV_EMBEDDING_DIM: &'static str = "SOPCHECK_EMBEDDING_DIM";
    const ENV_CALL_TIMEOUT: &'static str = "SOPCHECK_CALL_TIMEOUT_SECS";
    const ENV_MAX_ATTEMPTS: &'static str = "SOPCHECK_MAX_ATTEMPTS";
    const ENV_BACKOFF_MS: &'static str = "SOPCHECK_BACKOFF_MS";

    /// Loads configuration from environment variables (falling back to defaults) and validates it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            index: Self::parse_string_from_env(Self::ENV_INDEX, defaults.index),
            top_k: Self::parse_number_from_env(Self::ENV_TOP_K, defaults.top_k)?,
            threshold: Self::parse_number_from_env(Self::ENV_THRESHOLD, defaults.threshold)?,
            auto_satisfy_threshold: Self::parse_optional_number_from_env(Self::ENV_AUTO_SATISFY)?,
            parallelism: Self::parse_number_from_env(Self::ENV_PARALLELISM, defaults.parallelism)?,
            judge_model: Self::parse_string_from_env(Self::ENV_JUDGE_MODEL, defaults.judge_model),
            normalizer_model: Self::parse_optional_string_from_env(Self::ENV_NORMALIZER_MODEL),
            embedding_url: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_URL),
            embedding_model: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_MODEL,
                defaults.embedding_model,
            ),
            embedding_api_key: Self::parse_optional_string_from_env(Self::ENV_EMBEDDING_API_KEY),
            embedding_dim: Self::parse_number_from_env(
                Self::ENV_EMBEDDING_DIM,
                defaults.embedding_dim,
            )?,
            call_timeout_secs: Self::parse_number_from_env(
                Self::ENV_CALL_TIMEOUT,
                defaults.call_timeout_secs,
            )?,
            max_attempts: Self::parse_number_from_env(Self::ENV_MAX_ATTEMPTS, defaults.max_attempts)?,
            backoff_ms: Self::parse_number_from_env(Self::ENV_BACKOFF_MS, defaults.backoff_ms)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges. Called by [`from_env`](Self::from_env); call again after applying
    /// CLI overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.index.trim().is_empty() {
            return Err(ConfigError::Empty { name: Self::ENV_INDEX });
        }
        if self.top_k == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_TOP_K,
                value: self.top_k.to_string(),
                reason: "must be at least 1",
            });
        }
        Self::check_similarity(Self::ENV_THRESHOLD, self.threshold)?;
        if let Some(auto) = self.auto_satisfy_threshold {
            Self::check_similarity(Self::ENV_AUTO_SATISFY, auto)?;
            if auto < self.threshold {
                return Err(ConfigError::OutOfRange {
                    name: Self::ENV_AUTO_SATISFY,
                    value: auto.to_string(),
                    reason: "must not be below the similarity threshold",
                });
            }
        }
        for (name, value) in [
            (Self::ENV_PARALLELISM, self.parallelism as u64),
            (Self::ENV_EMBEDDING_DIM, self.embedding_dim as u64),
            (Self::ENV_CALL_TIMEOUT, self.call_timeout_secs),
            (Self::ENV_MAX_ATTEMPTS, u64::from(self.max_attempts)),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange {
                    name,
                    value: value.to_string(),
                    reason: "must be at least 1",
                });
            }
        }
        if self.judge_model.trim().is_empty() {
            return Err(ConfigError::Empty {
                name: Self::ENV_JUDGE_MODEL,
            });
        }
        Ok(())
    }

    pub fn matcher_config(&self) -> MatcherConfig {
        MatcherConfig {
            top_k: self.top_k,
            threshold: self.threshold,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.backoff_ms),
            Duration::from_secs(self.call_timeout_secs),
        )
    }

    pub fn adjudication_policy(&self) -> AdjudicationPolicy {
        AdjudicationPolicy::with_retry(self.retry_policy())
    }

    fn check_similarity(name: &'static str, value: f32) -> Result<(), ConfigError> {
        if !(-1.0..=1.0).contains(&value) {
            return Err(ConfigError::OutOfRange {
                name,
                value: value.to_string(),
                reason: "must be within [-1, 1]",
            });
        }
        Ok(())
    }

    fn parse_number_from_env<T>(name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::parse_optional_number_from_env(name)? {
            Some(value) => Ok(value),
            None => Ok(default),
        }
    }

    fn parse_optional_number_from_env<T>(name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::parse_optional_string_from_env(name) {
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidNumber {
                    name,
                    value,
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    fn parse_string_from_env(name: &str, default: String) -> String {
        Self::parse_optional_string_from_env(name).unwrap_or(default)
    }

    fn parse_optional_string_from_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}
