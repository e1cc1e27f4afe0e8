use crate::constants::DEGRADED_JUSTIFICATION;
use crate::retry::RetryPolicy;

use super::verdict::Classification;

/// What to do when the judge keeps failing.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjudicationPolicy {
    pub retry: RetryPolicy,
    /// Status recorded once retries are exhausted.
    pub degrade_to: Classification,
    pub degraded_justification: String,
}

impl Default for AdjudicationPolicy {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            degrade_to: Classification::Weak,
            degraded_justification: DEGRADED_JUSTIFICATION.to_string(),
        }
    }
}

impl AdjudicationPolicy {
    pub fn with_retry(retry: RetryPolicy) -> Self {
        Self {
            retry,
            ..Self::default()
        }
    }
}
