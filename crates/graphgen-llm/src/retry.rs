//! Retry decorator for LLM providers
//!
//! The extraction pipeline never retries a failed call itself. Deployments
//! that want backoff wrap their provider here instead, which keeps the glean
//! loop's call accounting exact.
//!
//! The pipeline bounds each `generate` call with its own deadline, and that
//! deadline covers every attempt made here. Give each attempt its own
//! timeout with [`RetryingProvider::with_attempt_timeout`] and size the
//! pipeline's deadline with [`RetryPolicy::call_budget`], so a hung attempt
//! is abandoned and retried instead of consuming the whole call.

use crate::LlmError;
use async_trait::async_trait;
use graphgen_domain::traits::LlmClient;
use graphgen_domain::ConversationHistory;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

/// Default number of retry attempts after the first failure
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Exponential backoff parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    pub initial_backoff_ms: u64,

    /// Upper bound on any single delay (milliseconds)
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): 1x, 2x, 4x, ... capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        let delay = self.initial_backoff_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_backoff_ms))
    }

    /// Worst-case duration of one retried call
    ///
    /// Every attempt runs for `attempt_timeout` and every backoff is slept.
    pub fn call_budget(&self, attempt_timeout: Duration) -> Duration {
        let attempts = self.max_retries.saturating_add(1);
        let backoffs: Duration = (1..=self.max_retries).map(|n| self.backoff(n)).sum();
        attempt_timeout.saturating_mul(attempts) + backoffs
    }
}

/// Wraps a provider and retries retryable failures with exponential backoff
///
/// Only [`LlmError::is_retryable`] errors are retried; anything else is
/// returned immediately.
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
    attempt_timeout: Option<Duration>,
}

impl<P> RetryingProvider<P> {
    /// Wrap `inner` with `policy`
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            attempt_timeout: None,
        }
    }

    /// Abandon any attempt that runs longer than `limit`
    ///
    /// An abandoned attempt fails with [`LlmError::Timeout`] and is retried
    /// like any other transient failure.
    pub fn with_attempt_timeout(mut self, limit: Duration) -> Self {
        self.attempt_timeout = Some(limit);
        self
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P> LlmClient for RetryingProvider<P>
where
    P: LlmClient<Error = LlmError>,
{
    type Error = LlmError;

    async fn generate(
        &self,
        prompt: &str,
        history: &ConversationHistory,
    ) -> Result<String, Self::Error> {
        let mut attempt = 0;
        loop {
            let outcome = match self.attempt_timeout {
                Some(limit) => timeout(limit, self.inner.generate(prompt, history))
                    .await
                    .unwrap_or_else(|_| Err(LlmError::Timeout(limit))),
                None => self.inner.generate(prompt, history).await,
            };
            match outcome {
                Ok(response) => {
                    if attempt > 0 {
                        info!(attempts = attempt + 1, "LLM call succeeded after retries");
                    }
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let backoff = self.policy.backoff(attempt);
                    warn!(
                        attempt,
                        max_retries = self.policy.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "LLM call failed, retrying"
                    );
                    sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with a communication error a fixed number of times, then answers
    struct Flaky {
        failures_left: AtomicU32,
        calls: AtomicU32,
        error: fn() -> LlmError,
    }

    #[async_trait]
    impl LlmClient for Flaky {
        type Error = LlmError;

        async fn generate(&self, _: &str, _: &ConversationHistory) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err((self.error)());
            }
            Ok("ok".to_string())
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 350,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
    }

    #[test]
    fn test_call_budget_covers_attempts_and_backoffs() {
        let policy = RetryPolicy {
            max_retries: 2,
            initial_backoff_ms: 100,
            max_backoff_ms: 150,
        };
        // 3 attempts of 10s, then 100ms + 150ms of backoff
        assert_eq!(
            policy.call_budget(Duration::from_secs(10)),
            Duration::from_millis(30_250)
        );

        let single = RetryPolicy {
            max_retries: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(single.call_budget(Duration::from_secs(5)), Duration::from_secs(5));
    }

    /// Hangs on the first call, answers afterwards
    struct SlowStart {
        calls: AtomicU32,
    }

    #[async_trait]
    impl LlmClient for SlowStart {
        type Error = LlmError;

        async fn generate(&self, _: &str, _: &ConversationHistory) -> Result<String, LlmError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                sleep(Duration::from_secs(600)).await;
            }
            Ok("ok".to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_attempt_is_abandoned_and_retried() {
        let slow = SlowStart {
            calls: AtomicU32::new(0),
        };
        let provider = RetryingProvider::new(slow, fast_policy(1))
            .with_attempt_timeout(Duration::from_secs(2));

        let result = provider.generate("p", &ConversationHistory::new()).await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_surfaces_when_retries_run_out() {
        let slow = SlowStart {
            calls: AtomicU32::new(0),
        };
        let provider = RetryingProvider::new(slow, fast_policy(0))
            .with_attempt_timeout(Duration::from_secs(2));

        let result = provider.generate("p", &ConversationHistory::new()).await;
        assert!(matches!(result, Err(LlmError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let flaky = Flaky {
            failures_left: AtomicU32::new(2),
            calls: AtomicU32::new(0),
            error: || LlmError::Communication("reset".into()),
        };
        let provider = RetryingProvider::new(flaky, fast_policy(3));

        let result = provider.generate("p", &ConversationHistory::new()).await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let flaky = Flaky {
            failures_left: AtomicU32::new(10),
            calls: AtomicU32::new(0),
            error: || LlmError::RateLimitExceeded,
        };
        let provider = RetryingProvider::new(flaky, fast_policy(2));

        let result = provider.generate("p", &ConversationHistory::new()).await;
        assert!(matches!(result, Err(LlmError::RateLimitExceeded)));
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let mut mock = MockProvider::default();
        mock.add_error("bad");
        let provider = RetryingProvider::new(mock, fast_policy(3));

        let result = provider.generate("bad", &ConversationHistory::new()).await;
        assert!(matches!(result, Err(LlmError::Other(_))));
        assert_eq!(provider.inner().call_count(), 1);
    }
}
