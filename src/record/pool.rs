use thiserror::Error;

use super::{AtomicRecord, RecordKind};
use crate::constants::validate_embedding_dim;

#[derive(Debug, Error, PartialEq)]
pub enum PoolError {
    #[error("record {id} is a {kind}, candidate pools hold statements only")]
    WrongKind { id: String, kind: RecordKind },

    #[error("statement {id} is malformed: {reason}")]
    Malformed { id: String, reason: String },

    #[error("statement {id} has dimension {actual}, pool dimension is {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },
}

/// Ephemeral statements of one target SOP, in extraction order.
///
/// Insertion order is significant: the matcher breaks score ties by it.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    source_document: String,
    statements: Vec<AtomicRecord>,
    dimension: Option<usize>,
    dropped: usize,
}

impl CandidatePool {
    pub fn new(source_document: impl Into<String>) -> Self {
        Self {
            source_document: source_document.into(),
            statements: Vec::new(),
            dimension: None,
            dropped: 0,
        }
    }

    /// Builds a pool, validating every statement.
    pub fn from_statements(
        source_document: impl Into<String>,
        statements: Vec<AtomicRecord>,
    ) -> Result<Self, PoolError> {
        let mut pool = Self::new(source_document);
        for statement in statements {
            pool.push(statement)?;
        }
        Ok(pool)
    }

    /// Appends a statement; the first statement fixes the pool dimension.
    pub fn push(&mut self, statement: AtomicRecord) -> Result<(), PoolError> {
        if statement.kind() != RecordKind::Statement {
            return Err(PoolError::WrongKind {
                id: statement.id().to_string(),
                kind: statement.kind(),
            });
        }
        if let Some(reason) = statement.check_well_formed() {
            return Err(PoolError::Malformed {
                id: statement.id().to_string(),
                reason,
            });
        }
        match self.dimension {
            Some(expected) => {
                validate_embedding_dim(statement.dimension(), expected).map_err(|_| {
                    PoolError::DimensionMismatch {
                        id: statement.id().to_string(),
                        expected,
                        actual: statement.dimension(),
                    }
                })?;
            }
            None => self.dimension = Some(statement.dimension()),
        }
        self.statements.push(statement);
        Ok(())
    }

    pub fn source_document(&self) -> &str {
        &self.source_document
    }

    pub fn statements(&self) -> &[AtomicRecord] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Records that `count` extracted statements were left out of the pool.
    pub fn with_dropped(mut self, count: usize) -> Self {
        self.dropped = count;
        self
    }

    /// Statements extracted from the document but never embedded.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Embedding dimension shared by all statements (`None` for an empty pool).
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}
