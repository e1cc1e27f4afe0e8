//! Judgment adjudication: turning a [`MatchResult`] into a status and justification.
//!
//! The judge is only consulted when the matcher found something. Its answer is wrapped at the
//! boundary into [`Classification`]; failures are retried per [`AdjudicationPolicy`] and then
//! degraded, so [`Adjudicator::adjudicate`] never fails.

mod error;
mod llm;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod policy;
mod verdict;

#[cfg(test)]
mod tests;

pub use error::AdjudicationError;
pub use llm::LlmJudge;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockJudge;
pub use policy::AdjudicationPolicy;
pub use verdict::{Classification, Verdict, parse_verdict};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::constants::MISSING_JUSTIFICATION;
use crate::matching::MatchResult;
use crate::record::AtomicRecord;
use crate::report::FindingStatus;

/// External judgment collaborator.
#[async_trait]
pub trait Judge: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Classifies how well `matched_texts` (rank order) discharge `requirement_text`.
    async fn judge(
        &self,
        requirement_text: &str,
        matched_texts: &[String],
    ) -> Result<Verdict, AdjudicationError>;
}

/// Outcome of adjudicating one requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjudication {
    pub status: FindingStatus,
    pub justification: String,
    /// The judge was unavailable and the policy's fallback was recorded.
    pub degraded: bool,
    /// Judge calls made (0 for MISSING and auto-satisfied requirements).
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct Adjudicator {
    judge: Arc<dyn Judge>,
    policy: AdjudicationPolicy,
    auto_satisfy_threshold: Option<f32>,
}

impl Adjudicator {
    pub fn new(judge: Arc<dyn Judge>, policy: AdjudicationPolicy) -> Self {
        Self {
            judge,
            policy,
            auto_satisfy_threshold: None,
        }
    }

    /// Skip the judge when the best match scores at least `threshold`.
    pub fn with_auto_satisfy(mut self, threshold: Option<f32>) -> Self {
        self.auto_satisfy_threshold = threshold;
        self
    }

    pub fn policy(&self) -> &AdjudicationPolicy {
        &self.policy
    }

    pub fn judge_name(&self) -> &str {
        self.judge.name()
    }

    pub async fn adjudicate(
        &self,
        requirement: &AtomicRecord,
        matches: &MatchResult,
    ) -> Adjudication {
        if matches.is_empty() {
            debug!(requirement_id = requirement.id(), "No match, MISSING");
            return Adjudication {
                status: FindingStatus::Missing,
                justification: MISSING_JUSTIFICATION.to_string(),
                degraded: false,
                attempts: 0,
            };
        }

        if let (Some(threshold), Some(top)) = (self.auto_satisfy_threshold, matches.top_score())
            && top >= threshold
        {
            debug!(
                requirement_id = requirement.id(),
                top_score = top,
                threshold,
                "Auto-satisfied without judge"
            );
            return Adjudication {
                status: FindingStatus::Satisfied,
                justification: format!(
                    "top match similarity {top:.2} meets auto-satisfy threshold {threshold:.2}"
                ),
                degraded: false,
                attempts: 0,
            };
        }

        let texts = matches.texts();
        let (result, attempts) = self
            .policy
            .retry
            .run_counted(requirement.id(), || {
                self.judge.judge(requirement.text(), &texts)
            })
            .await;

        match result {
            Ok(verdict) => {
                debug!(
                    requirement_id = requirement.id(),
                    classification = %verdict.classification,
                    attempts,
                    "Judge verdict"
                );
                Adjudication {
                    status: verdict.classification.into(),
                    justification: verdict.justification,
                    degraded: false,
                    attempts,
                }
            }
            Err(e) => {
                warn!(
                    requirement_id = requirement.id(),
                    judge = self.judge.name(),
                    attempts,
                    error = %e,
                    degrade_to = %self.policy.degrade_to,
                    "Adjudication unavailable, degrading"
                );
                Adjudication {
                    status: self.policy.degrade_to.into(),
                    justification: self.policy.degraded_justification.clone(),
                    degraded: true,
                    attempts,
                }
            }
        }
    }
}
