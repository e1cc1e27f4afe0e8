//! Atomic records: the normalized unit of meaning shared by the index and the candidate pool.
//!
//! A record is either a [`RecordKind::Requirement`] (from a reference document, persisted in the
//! [`RequirementIndex`](crate::index::RequirementIndex)) or a [`RecordKind::Statement`] (from the
//! target SOP, held in a [`CandidatePool`] for one run only).
//!
//! Records are immutable once built. Fields are private; use the constructors and accessors.

mod pool;


pub use pool::{CandidatePool, PoolError};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Origin of an [`AtomicRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Obligation extracted from a reference document.
    Requirement,
    /// Procedural claim extracted from the target SOP.
    Statement,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requirement => write!(f, "requirement"),
            Self::Statement => write!(f, "statement"),
        }
    }
}

/// Normative strength of a requirement (RFC 2119 style).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Must,
    Should,
    May,
    #[default]
    Unknown,
}

impl Severity {
    /// Infers severity from the modal verbs in `text`.
    ///
    /// The strongest modal wins, so "must ... and may ..." is [`Severity::Must`].
    pub fn detect(text: &str) -> Self {
        let mut found = Severity::Unknown;
        for word in text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
        {
            let candidate = match word.to_ascii_lowercase().as_str() {
                "must" | "shall" | "required" | "mandatory" => Severity::Must,
                "should" | "recommended" => Severity::Should,
                "may" | "optional" | "can" => Severity::May,
                _ => continue,
            };
            if candidate.rank() > found.rank() {
                found = candidate;
            }
        }
        found
    }

    fn rank(self) -> u8 {
        match self {
            Severity::Must => 3,
            Severity::Should => 2,
            Severity::May => 1,
            Severity::Unknown => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Must => "MUST",
            Severity::Should => "SHOULD",
            Severity::May => "MAY",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MUST" | "SHALL" | "REQUIRED" => Ok(Self::Must),
            "SHOULD" | "RECOMMENDED" => Ok(Self::Should),
            "MAY" | "OPTIONAL" => Ok(Self::May),
            "UNKNOWN" | "" => Ok(Self::Unknown),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic requirement or statement with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomicRecord {
    id: String,
    source_document: String,
    text: String,
    embedding: Vec<f32>,
    kind: RecordKind,
    #[serde(default)]
    page: u32,
    #[serde(default)]
    severity: Severity,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    context: String,
}

impl AtomicRecord {
    /// Creates a record. `text` is trimmed.
    pub fn new(
        id: impl Into<String>,
        kind: RecordKind,
        source_document: impl Into<String>,
        text: impl AsRef<str>,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            source_document: source_document.into(),
            text: text.as_ref().trim().to_string(),
            embedding,
            kind,
            page: 0,
            severity: Severity::Unknown,
            context: String::new(),
        }
    }

    /// Shorthand for a [`RecordKind::Requirement`] record.
    pub fn requirement(
        id: impl Into<String>,
        source_document: impl Into<String>,
        text: impl AsRef<str>,
        embedding: Vec<f32>,
    ) -> Self {
        Self::new(id, RecordKind::Requirement, source_document, text, embedding)
    }

    /// Shorthand for a [`RecordKind::Statement`] record.
    pub fn statement(
        id: impl Into<String>,
        source_document: impl Into<String>,
        text: impl AsRef<str>,
        embedding: Vec<f32>,
    ) -> Self {
        Self::new(id, RecordKind::Statement, source_document, text, embedding)
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_document(&self) -> &str {
        &self.source_document
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// 1-based page (or section) number; `0` when unknown.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Raw source passage this record was decomposed from (may be empty).
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Human-readable origin, e.g. `"gmp.txt (Page 3)"`.
    pub fn source_label(&self) -> String {
        if self.page == 0 {
            self.source_document.clone()
        } else {
            format!("{} (Page {})", self.source_document, self.page)
        }
    }

    /// Returns a reason if the record violates basic well-formedness.
    pub fn check_well_formed(&self) -> Option<String> {
        if self.id.trim().is_empty() {
            return Some("id is empty".to_string());
        }
        if self.text.is_empty() {
            return Some("text is empty".to_string());
        }
        if self.embedding.is_empty() {
            return Some("embedding is empty".to_string());
        }
        if self.embedding.iter().any(|v| !v.is_finite()) {
            return Some("embedding contains non-finite values".to_string());
        }
        None
    }
}
