//! The opaque text-generation source.
//!
//! Implementations wrap whatever actually answers a lookup prompt (an LLM
//! gateway, a search-grounded model, a fixture). The library makes no
//! schema assumption about the returned text; the normalizer deals with
//! whatever comes back.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SourceResult;

/// An opaque capability: given a prompt and a deadline, return text or fail.
///
/// Implementations should respect `timeout` as a hint; the source client
/// additionally enforces it via cancellation, so a slow implementation is
/// cut off either way.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Generate text for one prompt.
    async fn generate(&self, prompt: &str, timeout: Duration) -> SourceResult<String>;
}
