//! Reverse-check verification of Standard Operating Procedures.
//!
//! Reference documents (regulations, standards) are decomposed into atomic requirements,
//! embedded, and stored in a persistent [`RequirementIndex`]. A verify run decomposes an SOP
//! into candidate statements and, for **every** indexed requirement, searches the SOP for
//! supporting text ([`SemanticMatcher`]) and asks a judge to classify the support
//! ([`Adjudicator`]). The result is a [`GapReport`] with exactly one finding per requirement.
//!
//! # Modules
//!
//! - [`record`], [`index`], [`storage`] - requirement records and their durable index
//! - [`ingestion`], [`embedding`], [`llm`] - document decomposition and embedding
//! - [`matching`], [`adjudication`] - the per-requirement check
//! - [`orchestrator`], [`report`] - run state machine and gap report
//! - [`config`], [`retry`], [`cli`] - ambient plumbing
//!
//! ## Test/Mock Support
//! Mock collaborators are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod adjudication;
pub mod cli;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod hashing;
pub mod index;
pub mod ingestion;
pub mod llm;
pub mod matching;
pub mod orchestrator;
pub mod record;
pub mod report;
pub mod retry;
pub mod storage;

pub use adjudication::{
    Adjudication, AdjudicationError, AdjudicationPolicy, Adjudicator, Classification, Judge,
    LlmJudge, Verdict,
};
#[cfg(any(test, feature = "mock"))]
pub use adjudication::MockJudge;
pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use embedding::{CachedEmbedder, Embedder, EmbeddingError, HashEmbedder, HttpEmbedder};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use index::{IndexError, RequirementIndex};
pub use ingestion::{Ingestor, IngestionError, Normalizer, PlainTextNormalizer};
pub use matching::{MatchResult, MatchedStatement, MatcherConfig, SemanticMatcher};
pub use orchestrator::{CancelHandle, Orchestrator, ReverseCheck, RunError, RunState};
pub use record::{AtomicRecord, CandidatePool, RecordKind, Severity};
pub use report::{Finding, FindingStatus, GapReport, RunOutcome};
pub use retry::RetryPolicy;
pub use storage::{IndexStore, LocalIndexStore, StorageTarget};
#[cfg(any(test, feature = "mock"))]
pub use storage::MemoryIndexStore;
