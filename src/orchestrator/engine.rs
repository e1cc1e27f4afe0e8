use std::collections::HashMap;
use std::sync::Arc;

use futures_util::{StreamExt, stream};
use tracing::{debug, warn};

use super::cancel::CancelHandle;
use crate::adjudication::Adjudicator;
use crate::index::RequirementIndex;
use crate::matching::{MatchResult, SemanticMatcher};
use crate::record::{AtomicRecord, CandidatePool};
use crate::report::Finding;

/// The reverse check proper: every indexed requirement searched for in the candidate pool.
#[derive(Debug, Clone)]
pub struct ReverseCheck {
    matcher: SemanticMatcher,
    adjudicator: Arc<Adjudicator>,
    parallelism: usize,
}

impl ReverseCheck {
    pub fn new(matcher: SemanticMatcher, adjudicator: Arc<Adjudicator>, parallelism: usize) -> Self {
        Self {
            matcher,
            adjudicator,
            parallelism: parallelism.max(1),
        }
    }

    pub fn matcher(&self) -> &SemanticMatcher {
        &self.matcher
    }

    pub fn adjudicator(&self) -> &Adjudicator {
        &self.adjudicator
    }

    /// Matches every requirement, in index order. Pure and synchronous.
    pub fn match_all<'a>(
        &self,
        index: &'a RequirementIndex,
        pool: &CandidatePool,
    ) -> Vec<(&'a AtomicRecord, MatchResult)> {
        index
            .iter()
            .map(|requirement| (requirement, self.matcher.match_requirement(requirement, pool)))
            .collect()
    }

    /// Adjudicates matched requirements with bounded concurrency.
    ///
    /// Completion order is irrelevant: findings are keyed by requirement id and returned in
    /// the order of `matched`. Tasks that start after `cancel` fires become CANCELLED findings.
    pub async fn adjudicate_all(
        &self,
        matched: &[(&AtomicRecord, MatchResult)],
        cancel: &CancelHandle,
    ) -> Vec<Finding> {
        let mut by_id: HashMap<String, Finding> = stream::iter(matched.iter())
            .map(|(requirement, matches)| async move {
                let finding = if cancel.is_cancelled() {
                    Finding::cancelled(requirement)
                } else {
                    let adjudication = self.adjudicator.adjudicate(requirement, matches).await;
                    Finding::new(requirement, adjudication, matches.clone())
                };
                debug!(
                    requirement_id = requirement.id(),
                    status = %finding.status,
                    degraded = finding.degraded,
                    "Requirement checked"
                );
                (requirement.id().to_string(), finding)
            })
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        matched
            .iter()
            .map(|(requirement, _)| {
                by_id.remove(requirement.id()).unwrap_or_else(|| {
                    warn!(requirement_id = requirement.id(), "No finding recorded, marking cancelled");
                    Finding::cancelled(requirement)
                })
            })
            .collect()
    }

    /// [`match_all`](Self::match_all) then [`adjudicate_all`](Self::adjudicate_all).
    pub async fn check(
        &self,
        index: &RequirementIndex,
        pool: &CandidatePool,
        cancel: &CancelHandle,
    ) -> Vec<Finding> {
        let matched = self.match_all(index, pool);
        self.adjudicate_all(&matched, cancel).await
    }
}
