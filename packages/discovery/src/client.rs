//! Bounded-concurrency, rate-limited, retrying client for the text source.
//!
//! Uses the governor crate for proactive throttling: the token bucket is
//! drained before each call goes out, so the client slows down ahead of
//! upstream rate limits instead of reacting to them.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use rand::Rng;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{SourceError, SourceResult};
use crate::traits::source::TextSource;
use crate::types::config::ClientConfig;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Fan-out client over an opaque [`TextSource`].
///
/// The concurrency bound is the client's own and independent of anything
/// the orchestrator does above it.
pub struct SourceClient<S: TextSource> {
    source: Arc<S>,
    semaphore: Arc<Semaphore>,
    limiter: Arc<DefaultRateLimiter>,
    config: ClientConfig,
}

impl<S: TextSource> SourceClient<S> {
    /// Create a client around a text source.
    pub fn new(source: S, config: ClientConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second.max(1))
                .expect("requests_per_second is at least 1"),
        )
        .allow_burst(nonzero!(1u32));

        Self {
            source: Arc::new(source),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            limiter: Arc::new(RateLimiter::direct(quota)),
            config,
        }
    }

    /// Submit a batch of prompts.
    ///
    /// Order-preserving: the result vector has exactly one slot per prompt,
    /// in submission order. A prompt whose retries exhaust yields an error
    /// in its slot; the batch itself never fails.
    pub async fn submit_batch(&self, prompts: &[String]) -> Vec<SourceResult<String>> {
        let futures = prompts.iter().map(|prompt| self.call_with_retry(prompt));
        futures::future::join_all(futures).await
    }

    /// Call the source for one prompt with retries and backoff.
    pub async fn call_with_retry(&self, prompt: &str) -> SourceResult<String> {
        let attempts = self.config.max_attempts.max(1);
        let mut last_error: Option<SourceError> = None;

        for attempt in 1..=attempts {
            match self.call_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if attempt < attempts {
                        let delay = self.backoff_delay(attempt);
                        warn!(
                            attempt,
                            max_attempts = attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "source call failed, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        let last = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Err(SourceError::Exhausted { attempts, last })
    }

    /// One attempt: permit, throttle, call, deadline.
    async fn call_once(&self, prompt: &str) -> SourceResult<String> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");

        // Proactive throttle before the call goes out
        self.limiter.until_ready().await;

        let timeout = Duration::from_secs(self.config.call_timeout_secs);
        debug!(timeout_secs = self.config.call_timeout_secs, "dispatching source call");

        match tokio::time::timeout(timeout, self.source.generate(prompt, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                seconds: self.config.call_timeout_secs,
            }),
        }
    }

    /// Exponential backoff with jitter: half the capped delay is fixed,
    /// half is random.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self
            .config
            .base_backoff_ms
            .saturating_mul(1u64 << (attempt - 1).min(16));
        let capped = exp.min(self.config.max_backoff_ms).max(1);
        let jitter = rand::thread_rng().gen_range(0..=capped / 2);
        Duration::from_millis(capped / 2 + jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTextSource;

    fn fast_config() -> ClientConfig {
        ClientConfig::default()
            .with_max_attempts(3)
            .with_requests_per_second(1000)
            .with_call_timeout_secs(5)
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let source = MockTextSource::new()
            .with_response("alpha", "[\"a\"]")
            .with_response("beta", "[\"b\"]");
        let client = SourceClient::new(source, fast_config());

        let prompts = vec!["alpha".to_string(), "beta".to_string(), "alpha".to_string()];
        let results = client.submit_batch(&prompts).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap(), "[\"a\"]");
        assert_eq!(results[1].as_ref().unwrap(), "[\"b\"]");
        assert_eq!(results[2].as_ref().unwrap(), "[\"a\"]");
    }

    #[tokio::test]
    async fn test_one_failing_prompt_does_not_poison_batch() {
        let source = MockTextSource::new()
            .with_response("good", "[]")
            .with_failure("bad");
        let client = SourceClient::new(source, fast_config());

        let prompts = vec!["good".to_string(), "bad".to_string()];
        let results = client.submit_batch(&prompts).await;

        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(SourceError::Exhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        // Fails twice, then succeeds: 3 attempts are enough
        let source = MockTextSource::new()
            .with_transient_failures("flaky", 2)
            .with_response("flaky", "[]");
        let client = SourceClient::new(source, fast_config());

        let result = client.call_with_retry("flaky prompt").await;
        assert!(result.is_ok());
        assert_eq!(client.source.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let source = MockTextSource::new()
            .with_response("slow", "[]")
            .with_delay(Duration::from_secs(60));
        let config = fast_config()
            .with_call_timeout_secs(1)
            .with_max_attempts(1);
        let client = SourceClient::new(source, config);

        let result = client.call_with_retry("slow").await;
        assert!(matches!(result, Err(SourceError::Exhausted { .. })));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = ClientConfig {
            base_backoff_ms: 100,
            max_backoff_ms: 1_000,
            ..ClientConfig::default()
        };
        let client = SourceClient::new(MockTextSource::new(), config);

        let d1 = client.backoff_delay(1);
        let d5 = client.backoff_delay(5);
        assert!(d1.as_millis() >= 50 && d1.as_millis() <= 100);
        // 100 * 2^4 = 1600, capped at 1000; jittered within [500, 1000]
        assert!(d5.as_millis() >= 500 && d5.as_millis() <= 1_000);
    }
}
