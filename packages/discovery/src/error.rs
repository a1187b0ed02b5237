//! Typed errors for the discovery library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Per-prompt and per-row failures are absorbed where they happen and
//! surface only in logs and skip counters. The variants here are the ones
//! a caller can actually act on.

use thiserror::Error;

/// Errors that can occur during discovery operations.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The requested city is not in the reference table
    #[error("city not recognized: {name}")]
    CityNotFound { name: String },

    /// Persistence failed; gathered records are retained by the engine
    #[error("sink error: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A source call failed terminally (normally absorbed per prompt)
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Invalid configuration or reference data
    #[error("config error: {reason}")]
    Config { reason: String },

    /// JSON parsing error in reference data
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Errors from a single text-source call.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The call exceeded its deadline and was cancelled
    #[error("call timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The source reported a failure for this call
    #[error("generation failed: {reason}")]
    Generation { reason: String },

    /// All retry attempts for one prompt were used up
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Result type alias for single source calls.
pub type SourceResult<T> = std::result::Result<T, SourceError>;
