//! Document ingestion: read, normalize into atomic statements, embed.
//!
//! Reference documents become [`AtomicRecord`] requirements ready for
//! [`RequirementIndex::append`](crate::index::RequirementIndex::append); the target SOP becomes
//! a [`CandidatePool`] of statements for one verification run.
//!
//! Requirement ids are `<document>-<page>-<ordinal>`, so ingesting the same document twice
//! collides in the index instead of silently shadowing earlier records.

mod document;
mod error;
mod llm;
mod plain;

#[cfg(test)]
mod tests;

pub use document::{DocumentType, Page, decode_text, source_name, split_pages};
pub use error::{IngestionError, IngestionResult};
pub use llm::LlmNormalizer;
pub use plain::PlainTextNormalizer;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt, stream};
use tracing::{info, instrument, warn};

use crate::embedding::{Embedder, EmbeddingError};
use crate::record::{AtomicRecord, CandidatePool, RecordKind, Severity};
use crate::retry::RetryPolicy;

/// One atomic unit produced by a [`Normalizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedStatement {
    pub text: String,
    pub kind: RecordKind,
    /// 1-based page, 0 when unknown.
    pub page: u32,
    pub severity: Severity,
    /// Source passage the statement was taken from (may be empty).
    pub context: String,
}

/// Extraction + normalization collaborator.
///
/// Order of the returned statements is not significant. Empty texts are dropped by the
/// [`Ingestor`].
#[async_trait]
pub trait Normalizer: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn normalize(
        &self,
        bytes: &[u8],
        doc_type: DocumentType,
        source: &str,
    ) -> IngestionResult<Vec<NormalizedStatement>>;
}

/// A file that could not be ingested.
#[derive(Debug)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: IngestionError,
}

/// Result of ingesting several reference files independently.
#[derive(Debug, Default)]
pub struct ReferenceBatch {
    pub records: Vec<AtomicRecord>,
    pub files_ok: usize,
    pub failed: Vec<FailedFile>,
}

#[derive(Debug, Clone)]
pub struct Ingestor {
    normalizer: Arc<dyn Normalizer>,
    embedder: Arc<dyn Embedder>,
    retry: RetryPolicy,
    embed_concurrency: usize,
}

impl Ingestor {
    pub fn new(
        normalizer: Arc<dyn Normalizer>,
        embedder: Arc<dyn Embedder>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            normalizer,
            embedder,
            retry,
            embed_concurrency: 4,
        }
    }

    pub fn with_embed_concurrency(mut self, concurrency: usize) -> Self {
        self.embed_concurrency = concurrency.max(1);
        self
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Reads and normalizes one reference document into embedded requirements.
    ///
    /// Statement-kind output (descriptive text without an obligation) is dropped.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_reference(&self, path: &Path) -> IngestionResult<Vec<AtomicRecord>> {
        let (source, statements) = self.read_and_normalize(path).await?;

        let requirements: Vec<NormalizedStatement> = statements
            .into_iter()
            .filter(|s| s.kind == RecordKind::Requirement)
            .collect();

        let embeddings = self.embed_all(&source, &requirements).await?;

        // Dropped requirements still take an ordinal.
        let mut ordinals: HashMap<u32, usize> = HashMap::new();
        let records: Vec<AtomicRecord> = requirements
            .into_iter()
            .zip(embeddings)
            .filter_map(|(statement, embedding)| {
                let ordinal = ordinals.entry(statement.page).or_insert(0);
                *ordinal += 1;
                let embedding = embedding?;
                Some(
                    AtomicRecord::requirement(
                        format!("{}-{}-{}", source, statement.page, ordinal),
                        source.as_str(),
                        &statement.text,
                        embedding,
                    )
                    .with_page(statement.page)
                    .with_severity(statement.severity)
                    .with_context(statement.context),
                )
            })
            .collect();

        info!(%source, requirements = records.len(), "Reference document ingested");
        Ok(records)
    }

    /// Ingests each reference file independently; failures are collected, not fatal.
    pub async fn ingest_references(&self, paths: &[PathBuf]) -> ReferenceBatch {
        let mut batch = ReferenceBatch::default();
        for path in paths {
            match self.ingest_reference(path).await {
                Ok(records) => {
                    batch.records.extend(records);
                    batch.files_ok += 1;
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "Skipping reference file");
                    batch.failed.push(FailedFile {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }
        batch
    }

    /// Reads and normalizes the target SOP into a candidate pool.
    ///
    /// Every normalized entry becomes a statement, whatever kind the normalizer assigned.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_target(&self, path: &Path) -> IngestionResult<CandidatePool> {
        let (source, statements) = self.read_and_normalize(path).await?;
        let embeddings = self.embed_all(&source, &statements).await?;
        let dropped = embeddings.iter().filter(|e| e.is_none()).count();

        let records = statements
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .filter_map(|(i, (statement, embedding))| {
                Some(
                    AtomicRecord::statement(
                        format!("{}#S{}", source, i + 1),
                        source.as_str(),
                        &statement.text,
                        embedding?,
                    )
                    .with_page(statement.page)
                    .with_severity(statement.severity)
                    .with_context(statement.context),
                )
            })
            .collect();

        let pool = CandidatePool::from_statements(source.as_str(), records)?.with_dropped(dropped);
        info!(%source, statements = pool.len(), dropped, "Target document ingested");
        Ok(pool)
    }

    async fn read_and_normalize(
        &self,
        path: &Path,
    ) -> IngestionResult<(String, Vec<NormalizedStatement>)> {
        let doc_type = DocumentType::from_path(path);
        if !doc_type.is_text() {
            return Err(IngestionError::UnsupportedDocumentType {
                path: path.to_path_buf(),
                kind: doc_type,
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| IngestionError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let source = source_name(path);

        let mut statements = self.normalizer.normalize(&bytes, doc_type, &source).await?;
        let before = statements.len();
        statements.retain(|s| !s.text.trim().is_empty());
        if statements.len() < before {
            warn!(
                %source,
                dropped = before - statements.len(),
                "Normalizer returned empty statements"
            );
        }
        if statements.is_empty() {
            warn!(%source, normalizer = self.normalizer.name(), "Document produced no statements");
        }
        Ok((source, statements))
    }

    /// Embeds statement texts with bounded concurrency, preserving order.
    ///
    /// A text the embedder rejects outright (empty or over its input limit) yields `None` and
    /// is logged. Any other failure, after retries, fails the whole document.
    async fn embed_all(
        &self,
        source: &str,
        statements: &[NormalizedStatement],
    ) -> IngestionResult<Vec<Option<Vec<f32>>>> {
        let expected = self.embedder.dimension();
        stream::iter(statements.iter().map(|s| s.text.as_str()))
            .map(|text| async move {
                let embedding = self
                    .retry
                    .run(source, || self.embedder.embed(text))
                    .await
                    .and_then(|v| {
                        if v.len() == expected {
                            Ok(v)
                        } else {
                            Err(EmbeddingError::DimensionMismatch {
                                expected,
                                actual: v.len(),
                            })
                        }
                    });
                match embedding {
                    Ok(v) => Ok(Some(v)),
                    Err(error) if error.rejects_input() => {
                        warn!(
                            %source,
                            chars = text.chars().count(),
                            %error,
                            "Dropping statement the embedder cannot take"
                        );
                        Ok(None)
                    }
                    Err(error) => Err(IngestionError::Embedding {
                        source_document: source.to_string(),
                        error,
                    }),
                }
            })
            .buffered(self.embed_concurrency)
            .try_collect()
            .await
    }
}
