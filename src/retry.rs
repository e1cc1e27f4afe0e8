//! Retry/backoff policy for external collaborator calls.
//!
//! Every embedding, judgment, and normalization call goes through [`RetryPolicy::run`], which
//! wraps each attempt in a timeout and sleeps with exponential backoff between attempts.
//! A timeout is reported as an ordinary error of the caller's type via `From<TimedOut>`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::constants::{
    DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_BACKOFF,
};

/// A single attempt exceeded the policy's call timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedOut {
    pub after: Duration,
}

impl Display for TimedOut {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timed out after {}ms", self.after.as_millis())
    }
}

/// Errors that can flow through [`RetryPolicy::run`].
pub trait RetryableError: From<TimedOut> + Display {
    /// Whether another attempt could succeed. Defaults to `true`.
    fn is_retryable(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    backoff_multiplier: f64,
    call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: DEFAULT_MAX_BACKOFF,
            backoff_multiplier: 2.0,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; values below 1 are raised to 1.
    pub fn new(max_attempts: u32, initial_backoff: Duration, call_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            call_timeout,
            ..Self::default()
        }
    }

    /// Single attempt, no backoff.
    pub fn no_retry(call_timeout: Duration) -> Self {
        Self::new(1, Duration::ZERO, call_timeout)
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Delay before retry number `retry` (1 = the delay after the first failure).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        let millis = self.initial_backoff.as_millis() as f64 * factor;
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or attempts run out.
    pub async fn run<T, E, F, Fut>(&self, label: &str, op: F) -> Result<T, E>
    where
        E: RetryableError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_counted(label, op).await.0
    }

    /// Like [`run`](Self::run), also returning how many attempts were made.
    pub async fn run_counted<T, E, F, Fut>(&self, label: &str, mut op: F) -> (Result<T, E>, u32)
    where
        E: RetryableError,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match tokio::time::timeout(self.call_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(E::from(TimedOut {
                    after: self.call_timeout,
                })),
            };

            match result {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(%label, attempt, "Call succeeded after retry");
                    }
                    return (Ok(value), attempt);
                }
                Err(e) if attempt < self.max_attempts && e.is_retryable() => {
                    let delay = self.backoff_for(attempt);
                    warn!(
                        %label,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }
}
