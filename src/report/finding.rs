use serde::{Deserialize, Serialize};

use super::status::FindingStatus;
use crate::adjudication::Adjudication;
use crate::constants::CANCELLED_JUSTIFICATION;
use crate::matching::{MatchResult, MatchedStatement};
use crate::record::{AtomicRecord, Severity};

/// Verdict for one reference requirement. Built once per requirement per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub requirement_id: String,
    pub source_document: String,
    pub page: u32,
    pub severity: Severity,
    pub source_reference_text: String,
    pub status: FindingStatus,
    pub justification: String,
    pub matched_statements: Vec<MatchedStatement>,
    /// The judge was unavailable and the fallback status was recorded.
    #[serde(default)]
    pub degraded: bool,
}

impl Finding {
    pub fn new(requirement: &AtomicRecord, adjudication: Adjudication, matches: MatchResult) -> Self {
        Self {
            requirement_id: requirement.id().to_string(),
            source_document: requirement.source_document().to_string(),
            page: requirement.page(),
            severity: requirement.severity(),
            source_reference_text: requirement.text().to_string(),
            status: adjudication.status,
            justification: adjudication.justification,
            matched_statements: matches.into_matches(),
            degraded: adjudication.degraded,
        }
    }

    /// Finding for a requirement the run never got to.
    pub fn cancelled(requirement: &AtomicRecord) -> Self {
        Self::new(
            requirement,
            Adjudication {
                status: FindingStatus::Cancelled,
                justification: CANCELLED_JUSTIFICATION.to_string(),
                degraded: false,
                attempts: 0,
            },
            MatchResult::empty(),
        )
    }

    /// `"doc (Page n)"`, or just the document when the page is unknown.
    pub fn source_label(&self) -> String {
        if self.page == 0 {
            self.source_document.clone()
        } else {
            format!("{} (Page {})", self.source_document, self.page)
        }
    }
}
