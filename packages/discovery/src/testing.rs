//! Test doubles for the source and sink seams.
//!
//! `MockTextSource` matches prompts by substring pattern and replays
//! canned responses, with knobs for hard failures, transient failures
//! and artificial latency. `FailingSink` always errors. Both are used
//! by the unit tests here and the integration tests under `tests/`.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DiscoveryError, Result, SourceError, SourceResult};
use crate::traits::{RecordSink, TextSource};
use crate::types::DoctorRecord;

#[derive(Debug, Clone)]
struct CannedResponse {
    pattern: String,
    body: String,
}

#[derive(Debug)]
struct TransientFailure {
    pattern: String,
    remaining: u32,
}

#[derive(Default)]
struct MockState {
    responses: Vec<CannedResponse>,
    failures: Vec<String>,
    transient: Vec<TransientFailure>,
    calls: Vec<String>,
}

/// In-memory [`TextSource`] for tests.
///
/// Prompts are matched against registered patterns by substring; the
/// first match wins. Unmatched prompts get an empty JSON array, which
/// normalizes to zero entries. Clones share state, so a kept clone can
/// inspect the call log after the source moves into an engine.
#[derive(Clone, Default)]
pub struct MockTextSource {
    state: Arc<RwLock<MockState>>,
    delay: Option<Duration>,
}

impl MockTextSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canned response for prompts containing `pattern`.
    pub fn with_response(self, pattern: impl Into<String>, body: impl Into<String>) -> Self {
        self.state.write().unwrap().responses.push(CannedResponse {
            pattern: pattern.into(),
            body: body.into(),
        });
        self
    }

    /// Prompts containing `pattern` always fail.
    pub fn with_failure(self, pattern: impl Into<String>) -> Self {
        self.state.write().unwrap().failures.push(pattern.into());
        self
    }

    /// Prompts containing `pattern` fail the first `count` times, then
    /// fall through to normal matching.
    pub fn with_transient_failures(self, pattern: impl Into<String>, count: u32) -> Self {
        self.state.write().unwrap().transient.push(TransientFailure {
            pattern: pattern.into(),
            remaining: count,
        });
        self
    }

    /// Sleep this long before every response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every prompt seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.state.read().unwrap().calls.clone()
    }
}

#[async_trait]
impl TextSource for MockTextSource {
    async fn generate(&self, prompt: &str, _timeout: Duration) -> SourceResult<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        state.calls.push(prompt.to_string());

        if let Some(transient) = state
            .transient
            .iter_mut()
            .find(|t| t.remaining > 0 && prompt.contains(&t.pattern))
        {
            transient.remaining -= 1;
            return Err(SourceError::Generation {
                reason: format!("transient failure for '{}'", transient.pattern),
            });
        }

        if let Some(pattern) = state.failures.iter().find(|p| prompt.contains(p.as_str())) {
            return Err(SourceError::Generation {
                reason: format!("permanent failure for '{pattern}'"),
            });
        }

        let body = state
            .responses
            .iter()
            .find(|r| prompt.contains(&r.pattern))
            .map(|r| r.body.clone())
            .unwrap_or_else(|| "[]".to_string());
        Ok(body)
    }
}

/// A [`RecordSink`] that rejects every persist call.
#[derive(Default)]
pub struct FailingSink;

#[async_trait]
impl RecordSink for FailingSink {
    async fn persist(&self, _records: &[DoctorRecord]) -> Result<()> {
        Err(DiscoveryError::Sink("sink unavailable".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_matching_pattern_wins() {
        let source = MockTextSource::new()
            .with_response("cardiologist", "[1]")
            .with_response("cardio", "[2]");
        let body = source
            .generate("best cardiologist in Mumbai", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(body, "[1]");
    }

    #[tokio::test]
    async fn test_unmatched_prompt_returns_empty_array() {
        let source = MockTextSource::new();
        let body = source
            .generate("anything", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(body, "[]");
        assert_eq!(source.calls(), vec!["anything".to_string()]);
    }

    #[tokio::test]
    async fn test_transient_failures_expire() {
        let source = MockTextSource::new()
            .with_transient_failures("flaky", 2)
            .with_response("flaky", "[\"ok\"]");
        assert!(source.generate("flaky", Duration::from_secs(1)).await.is_err());
        assert!(source.generate("flaky", Duration::from_secs(1)).await.is_err());
        let body = source.generate("flaky", Duration::from_secs(1)).await.unwrap();
        assert_eq!(body, "[\"ok\"]");
    }
}
