//! The requirement index: durable, append-only collection of reference requirements.
//!
//! [`RequirementIndex`] is an immutable value. [`RequirementIndex::append`] returns a new index
//! and leaves the receiver untouched, so a failed append can never poison the index a caller
//! already holds. Persistence is an explicit side effect through an
//! [`IndexStore`](crate::storage::IndexStore) handle passed to [`RequirementIndex::load`] and
//! [`RequirementIndex::persist`].
//!
//! # Ordering
//!
//! [`RequirementIndex::iter`] yields records grouped by source document (documents in order of
//! first appearance), insertion order within each document. Gap reports follow this order.
//!
//! # Blob format
//!
//! ```json
//! { "format_version": 1, "dimension": 384, "requirements": [ { "id": "...", ... } ] }
//! ```

pub mod error;


pub use error::{IndexError, IndexResult};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::constants::{INDEX_FORMAT_VERSION, validate_embedding_dim};
use crate::hashing::Fingerprinter;
use crate::record::{AtomicRecord, RecordKind};
use crate::storage::IndexStore;

#[derive(Debug, Serialize, Deserialize)]
struct IndexBlob {
    format_version: u32,
    dimension: Option<usize>,
    requirements: Vec<AtomicRecord>,
}

#[derive(Debug, Clone, PartialEq)]
struct DocumentPartition {
    name: String,
    positions: Vec<usize>,
}

/// Insertion-ordered requirements, partitioned by source document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementIndex {
    dimension: Option<usize>,
    records: Vec<AtomicRecord>,
    documents: Vec<DocumentPartition>,
    ids: HashSet<String>,
}

impl RequirementIndex {
    /// Creates an empty index with no established dimension.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new index with `records` appended.
    ///
    /// All-or-nothing: on error `self` is unchanged and nothing is appended.
    ///
    /// # Errors
    ///
    /// - [`IndexError::InvalidRecord`] for statements, empty text, or empty/non-finite embeddings
    /// - [`IndexError::DimensionMismatch`] if an embedding differs from the established dimension
    ///   (for an empty index, the first record of the batch establishes it)
    /// - [`IndexError::DuplicateId`] if an id exists in the index or repeats within the batch
    pub fn append(&self, records: Vec<AtomicRecord>) -> IndexResult<RequirementIndex> {
        let mut next = self.clone();
        for record in records {
            next.push(record)?;
        }
        debug!(
            appended = next.len() - self.len(),
            total = next.len(),
            "Appended requirements to index"
        );
        Ok(next)
    }

    fn push(&mut self, record: AtomicRecord) -> IndexResult<()> {
        if record.kind() != RecordKind::Requirement {
            return Err(IndexError::InvalidRecord {
                id: record.id().to_string(),
                reason: format!("expected a requirement, got a {}", record.kind()),
            });
        }
        if let Some(reason) = record.check_well_formed() {
            return Err(IndexError::InvalidRecord {
                id: record.id().to_string(),
                reason,
            });
        }

        match self.dimension {
            Some(expected) => validate_embedding_dim(record.dimension(), expected).map_err(
                |_| IndexError::DimensionMismatch {
                    id: record.id().to_string(),
                    expected,
                    actual: record.dimension(),
                },
            )?,
            None => self.dimension = Some(record.dimension()),
        }

        if !self.ids.insert(record.id().to_string()) {
            return Err(IndexError::DuplicateId {
                id: record.id().to_string(),
            });
        }

        let position = self.records.len();
        match self
            .documents
            .iter_mut()
            .find(|d| d.name == record.source_document())
        {
            Some(partition) => partition.positions.push(position),
            None => self.documents.push(DocumentPartition {
                name: record.source_document().to_string(),
                positions: vec![position],
            }),
        }
        self.records.push(record);
        Ok(())
    }

    /// Iterates requirements in canonical report order. Restartable: call again for a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = &AtomicRecord> + '_ {
        self.documents
            .iter()
            .flat_map(move |d| d.positions.iter().map(move |&i| &self.records[i]))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index-wide embedding dimension (`None` until the first record is appended).
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Source documents in order of first appearance.
    pub fn documents(&self) -> impl Iterator<Item = &str> + '_ {
        self.documents.iter().map(|d| d.name.as_str())
    }

    /// Requirements of one source document, in insertion order.
    pub fn by_source(&self, source: &str) -> Vec<&AtomicRecord> {
        self.documents
            .iter()
            .filter(|d| d.name == source)
            .flat_map(|d| d.positions.iter().map(|&i| &self.records[i]))
            .collect()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&AtomicRecord> {
        if !self.ids.contains(id) {
            return None;
        }
        self.records.iter().find(|r| r.id() == id)
    }

    /// Short BLAKE3 fingerprint of the index contents, reported as the index version.
    pub fn fingerprint(&self) -> String {
        let mut fingerprinter = Fingerprinter::new();
        for record in self.iter() {
            fingerprinter.update_record(
                record.id(),
                record.source_document(),
                record.text(),
                record.embedding(),
            );
        }
        fingerprinter.finalize_short_hex()
    }

    /// Decodes and validates a persisted blob.
    ///
    /// Any decode or validation failure is reported as [`IndexError::Corrupt`].
    pub fn from_bytes(bytes: &[u8]) -> IndexResult<Self> {
        let blob: IndexBlob = serde_json::from_slice(bytes).map_err(|e| IndexError::Corrupt {
            reason: format!("undecodable blob: {e}"),
        })?;

        if blob.format_version != INDEX_FORMAT_VERSION {
            return Err(IndexError::Corrupt {
                reason: format!(
                    "unsupported format version {} (expected {})",
                    blob.format_version, INDEX_FORMAT_VERSION
                ),
            });
        }

        let index = Self::new()
            .append(blob.requirements)
            .map_err(|e| IndexError::Corrupt {
                reason: e.to_string(),
            })?;

        if let (Some(declared), Some(actual)) = (blob.dimension, index.dimension)
            && declared != actual
        {
            return Err(IndexError::Corrupt {
                reason: format!("declared dimension {declared} but records have {actual}"),
            });
        }

        Ok(index)
    }

    /// Encodes the index as a JSON blob (records in canonical order).
    pub fn to_bytes(&self) -> IndexResult<Vec<u8>> {
        let blob = IndexBlob {
            format_version: INDEX_FORMAT_VERSION,
            dimension: self.dimension,
            requirements: self.iter().cloned().collect(),
        };
        serde_json::to_vec_pretty(&blob).map_err(|e| IndexError::Serialization(e.to_string()))
    }

    /// Loads the index from `store`.
    ///
    /// Returns [`IndexError::NotFound`] when nothing has been persisted yet.
    #[instrument(skip(store), fields(location = %store.location()))]
    pub async fn load(store: &dyn IndexStore) -> IndexResult<Self> {
        let bytes = store
            .load()
            .await?
            .ok_or_else(|| IndexError::NotFound {
                location: store.location(),
            })?;
        let index = Self::from_bytes(&bytes)?;
        info!(
            requirements = index.len(),
            documents = index.documents.len(),
            dimension = ?index.dimension,
            "Requirement index loaded"
        );
        Ok(index)
    }

    /// Loads the index, or starts empty if none has been persisted yet.
    pub async fn load_or_empty(store: &dyn IndexStore) -> IndexResult<Self> {
        match Self::load(store).await {
            Err(IndexError::NotFound { location }) => {
                info!(%location, "No existing index, starting empty");
                Ok(Self::new())
            }
            other => other,
        }
    }

    /// Durably writes the full index to `store`.
    #[instrument(skip(self, store), fields(location = %store.location(), requirements = self.len()))]
    pub async fn persist(&self, store: &dyn IndexStore) -> IndexResult<()> {
        let bytes = self.to_bytes()?;
        store.save(&bytes).await?;
        info!(bytes = bytes.len(), "Requirement index persisted");
        Ok(())
    }
}
