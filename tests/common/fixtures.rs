//! Test fixtures for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sopcheck::adjudication::{AdjudicationPolicy, Adjudicator, MockJudge};
use sopcheck::embedding::MockEmbedder;
use sopcheck::index::RequirementIndex;
use sopcheck::ingestion::{Ingestor, PlainTextNormalizer};
use sopcheck::matching::{MatcherConfig, SemanticMatcher};
use sopcheck::orchestrator::{Orchestrator, ReverseCheck};
use sopcheck::record::AtomicRecord;
use sopcheck::retry::RetryPolicy;
use sopcheck::storage::MemoryIndexStore;

pub const DIMENSION: usize = 2;

pub const REFERENCE_DOC: &str = "21-cfr-211.txt";

/// Unit vector at `similarity` cosine distance from `[1, 0]`.
pub fn vector_at(similarity: f32) -> Vec<f32> {
    vec![similarity, (1.0 - similarity * similarity).max(0.0).sqrt()]
}

pub fn requirement(id: &str, text: &str) -> AtomicRecord {
    AtomicRecord::requirement(id, REFERENCE_DOC, text, vec![1.0, 0.0])
}

/// `n` requirements `R1..Rn` with text `"requirement i"`, all embedded at `[1, 0]`.
pub fn numbered_index(n: usize) -> RequirementIndex {
    let records = (1..=n)
        .map(|i| requirement(&format!("R{i}"), &format!("requirement {i}")))
        .collect();
    RequirementIndex::new()
        .append(records)
        .expect("fixture index should build")
}

pub async fn store_with(index: &RequirementIndex) -> Arc<MemoryIndexStore> {
    let store = Arc::new(MemoryIndexStore::new());
    index
        .persist(store.as_ref())
        .await
        .expect("memory store should accept the index");
    store
}

/// Writes an SOP with one statement per paragraph.
pub fn write_sop(dir: &Path, statements: &[&str]) -> PathBuf {
    let path = dir.join("sop.txt");
    std::fs::write(&path, statements.join("\n\n")).expect("Failed to write SOP");
    path
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_millis(1), Duration::from_secs(5))
}

pub fn matcher_config(threshold: f32) -> MatcherConfig {
    MatcherConfig {
        top_k: 3,
        threshold,
    }
}

pub fn engine(judge: &MockJudge, threshold: f32, parallelism: usize) -> ReverseCheck {
    let adjudicator = Adjudicator::new(
        Arc::new(judge.clone()),
        AdjudicationPolicy::with_retry(fast_retry()),
    );
    ReverseCheck::new(
        SemanticMatcher::new(matcher_config(threshold)).expect("valid matcher config"),
        Arc::new(adjudicator),
        parallelism,
    )
}

pub fn orchestrator(
    store: Arc<MemoryIndexStore>,
    embedder: MockEmbedder,
    engine: ReverseCheck,
) -> Orchestrator {
    let ingestor = Ingestor::new(
        Arc::new(PlainTextNormalizer::new()),
        Arc::new(embedder),
        fast_retry(),
    );
    Orchestrator::new(store, ingestor, engine)
}
