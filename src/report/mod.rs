//! Gap reports: one [`Finding`] per indexed requirement, in index order, plus run metadata.

mod finding;
mod render;
mod status;


pub use finding::Finding;
pub use status::{FindingStatus, StatusCounts};

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::matching::MatcherConfig;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write report to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every finding was fully adjudicated.
    Success,
    /// Report is total, but some findings used the adjudication fallback.
    PartialDegradation,
    /// Run was cancelled mid-way; unstarted requirements are CANCELLED.
    Cancelled,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::PartialDegradation => write!(f, "partial-degradation"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
    /// The SOP that was checked.
    pub target: String,
    pub generated_at: DateTime<Utc>,
    /// Fingerprint of the index the run was checked against.
    pub index_version: String,
    pub index_size: usize,
    pub dimension: Option<usize>,
    /// SOP statements the embedder refused, left out of matching.
    #[serde(default)]
    pub dropped_statements: usize,
    pub matcher: MatcherConfig,
    pub judge: String,
}

impl RunMetadata {
    pub fn new(target: impl Into<String>, matcher: MatcherConfig, judge: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            target: target.into(),
            generated_at: Utc::now(),
            index_version: String::new(),
            index_size: 0,
            dimension: None,
            dropped_statements: 0,
            matcher,
            judge: judge.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub counts: StatusCounts,
    pub degraded: usize,
    pub outcome: RunOutcome,
}

impl ReportSummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let counts: StatusCounts = findings.iter().map(|f| &f.status).collect();
        let degraded = findings.iter().filter(|f| f.degraded).count();
        let outcome = if counts.cancelled > 0 {
            RunOutcome::Cancelled
        } else if degraded > 0 {
            RunOutcome::PartialDegradation
        } else {
            RunOutcome::Success
        };
        Self {
            total: findings.len(),
            counts,
            degraded,
            outcome,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub metadata: RunMetadata,
    pub summary: ReportSummary,
    pub findings: Vec<Finding>,
}

impl GapReport {
    /// Builds a report from findings already in index order.
    pub fn assemble(metadata: RunMetadata, findings: Vec<Finding>) -> Self {
        let summary = ReportSummary::from_findings(&findings);
        Self {
            metadata,
            summary,
            findings,
        }
    }

    /// Findings that are not SATISFIED, in report order.
    pub fn gaps(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(|f| f.status.is_gap())
    }

    pub fn outcome(&self) -> RunOutcome {
        self.summary.outcome
    }

    pub fn to_json(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> ReportResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_markdown(&self) -> String {
        render::markdown(self)
    }

    /// Summary counts plus the first `limit` gaps, for terminal output.
    pub fn console_summary(&self, limit: usize) -> String {
        render::console_summary(self, limit)
    }

    /// Writes the report; a `.md` extension selects Markdown, anything else JSON.
    pub async fn write_to(&self, path: &Path) -> ReportResult<()> {
        let markdown = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
        let body = if markdown {
            self.to_markdown()
        } else {
            self.to_json()?
        };

        let write_err = |source| ReportError::Write {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(path, body).await.map_err(write_err)?;

        info!(
            path = %path.display(),
            format = if markdown { "markdown" } else { "json" },
            findings = self.findings.len(),
            "Gap report written"
        );
        Ok(())
    }
}
