//! Semantic matching of one requirement against a candidate pool.
//!
//! [`SemanticMatcher::match_requirement`] is pure: no I/O, no suspension, and the same inputs
//! always produce the same [`MatchResult`] (order and scores).

mod error;
mod similarity;

#[cfg(test)]
mod tests;

pub use error::{MatchingError, MatchingResult};
pub use similarity::{cosine_similarity, is_zero_norm};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TOP_K};
use crate::record::{AtomicRecord, CandidatePool};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Maximum statements kept per requirement.
    pub top_k: usize,
    /// Minimum cosine similarity (inclusive).
    pub threshold: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> MatchingResult<()> {
        if self.top_k == 0 {
            return Err(MatchingError::ZeroTopK);
        }
        if !(-1.0..=1.0).contains(&self.threshold) {
            return Err(MatchingError::ThresholdOutOfRange(self.threshold));
        }
        Ok(())
    }
}

/// A candidate statement that survived the threshold, with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedStatement {
    pub statement_id: String,
    pub text: String,
    pub page: u32,
    pub score: f32,
}

/// Up to K matches for one requirement, highest score first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    matches: Vec<MatchedStatement>,
}

impl MatchResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a result from already-scored matches, re-sorting them highest first.
    pub fn from_matches(mut matches: Vec<MatchedStatement>) -> Self {
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self { matches }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchedStatement> {
        self.matches.iter()
    }

    /// Matched texts in rank order, as handed to the judge.
    pub fn texts(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.text.clone()).collect()
    }

    pub fn top_score(&self) -> Option<f32> {
        self.matches.first().map(|m| m.score)
    }

    pub fn into_matches(self) -> Vec<MatchedStatement> {
        self.matches
    }
}

impl<'a> IntoIterator for &'a MatchResult {
    type Item = &'a MatchedStatement;
    type IntoIter = std::slice::Iter<'a, MatchedStatement>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

#[derive(Debug, Clone)]
pub struct SemanticMatcher {
    config: MatcherConfig,
}

impl SemanticMatcher {
    pub fn new(config: MatcherConfig) -> MatchingResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Ranks `pool` against `requirement`.
    ///
    /// Statements scoring below the threshold are discarded. Ties keep pool order.
    /// Statements whose dimension differs from the requirement, and zero-norm vectors on
    /// either side, are skipped with a warning.
    pub fn match_requirement(
        &self,
        requirement: &AtomicRecord,
        pool: &CandidatePool,
    ) -> MatchResult {
        let query = requirement.embedding();
        if is_zero_norm(query) {
            warn!(
                requirement_id = requirement.id(),
                "Skipping requirement: zero-norm embedding"
            );
            return MatchResult::default();
        }

        let mut scored: Vec<(usize, f32)> = pool
            .statements()
            .iter()
            .enumerate()
            .filter_map(|(position, statement)| {
                if statement.dimension() != query.len() {
                    warn!(
                        requirement_id = requirement.id(),
                        statement_id = statement.id(),
                        expected_dim = query.len(),
                        actual_dim = statement.dimension(),
                        "Skipping statement: embedding dimension mismatch"
                    );
                    return None;
                }
                if is_zero_norm(statement.embedding()) {
                    warn!(
                        requirement_id = requirement.id(),
                        statement_id = statement.id(),
                        "Skipping statement: zero-norm embedding"
                    );
                    return None;
                }
                let score = cosine_similarity(query, statement.embedding());
                if !score.is_finite() {
                    warn!(
                        requirement_id = requirement.id(),
                        statement_id = statement.id(),
                        "Skipping statement: non-finite similarity"
                    );
                    return None;
                }
                (score >= self.config.threshold).then_some((position, score))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(self.config.top_k);

        let statements = pool.statements();
        let matches: Vec<MatchedStatement> = scored
            .into_iter()
            .map(|(position, score)| {
                let statement = &statements[position];
                MatchedStatement {
                    statement_id: statement.id().to_string(),
                    text: statement.text().to_string(),
                    page: statement.page(),
                    score,
                }
            })
            .collect();

        debug!(
            requirement_id = requirement.id(),
            pool_size = pool.len(),
            matched = matches.len(),
            top_score = matches.first().map(|m| m.score),
            "Matched requirement"
        );

        MatchResult { matches }
    }
}
