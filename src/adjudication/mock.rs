use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Judge;
use super::error::AdjudicationError;
use super::verdict::{Classification, Verdict};

/// Scriptable judge for tests.
///
/// Returns a default verdict unless a requirement text has its own. Requirements registered
/// with [`fail_on`](MockJudge::fail_on) always error; [`delay_for`](MockJudge::delay_for)
/// holds a call back to force out-of-order completion.
#[derive(Debug, Clone)]
pub struct MockJudge {
    default: Verdict,
    verdicts: Arc<Mutex<HashMap<String, Verdict>>>,
    failing: Arc<Mutex<HashMap<String, AdjudicationError>>>,
    transient: Arc<Mutex<HashMap<String, usize>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Default for MockJudge {
    fn default() -> Self {
        Self::new(Verdict::new(Classification::Satisfied, "mock verdict"))
    }
}

impl MockJudge {
    pub fn new(default: Verdict) -> Self {
        Self {
            default,
            verdicts: Arc::default(),
            failing: Arc::default(),
            transient: Arc::default(),
            delays: Arc::default(),
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::default(),
        }
    }

    pub fn with_verdict(self, requirement_text: impl Into<String>, verdict: Verdict) -> Self {
        self.verdicts.lock().insert(requirement_text.into(), verdict);
        self
    }

    /// Every call for `requirement_text` fails.
    pub fn fail_on(self, requirement_text: impl Into<String>) -> Self {
        self.fail_with(
            requirement_text,
            AdjudicationError::Request {
                reason: "simulated judge outage".to_string(),
            },
        )
    }

    pub fn fail_with(self, requirement_text: impl Into<String>, error: AdjudicationError) -> Self {
        self.failing.lock().insert(requirement_text.into(), error);
        self
    }

    /// The first `times` calls for `requirement_text` fail, later ones succeed.
    pub fn fail_times(self, requirement_text: impl Into<String>, times: usize) -> Self {
        self.transient.lock().insert(requirement_text.into(), times);
        self
    }

    pub fn delay_for(self, requirement_text: impl Into<String>, delay: Duration) -> Self {
        self.delays.lock().insert(requirement_text.into(), delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requirement texts in call order.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl Judge for MockJudge {
    fn name(&self) -> &str {
        "mock"
    }

    async fn judge(
        &self,
        requirement_text: &str,
        _matched_texts: &[String],
    ) -> Result<Verdict, AdjudicationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(requirement_text.to_string());

        let delay = self.delays.lock().get(requirement_text).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failing.lock().get(requirement_text) {
            return Err(error.clone());
        }
        if let Some(remaining) = self.transient.lock().get_mut(requirement_text)
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(AdjudicationError::Request {
                reason: "simulated transient failure".to_string(),
            });
        }

        Ok(self
            .verdicts
            .lock()
            .get(requirement_text)
            .cloned()
            .unwrap_or_else(|| self.default.clone()))
    }
}
