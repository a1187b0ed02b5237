//! Multi-Source Professional Directory Discovery
//!
//! A query-driven pipeline that discovers medical professionals across an
//! opaque text source: it fans prompts out per city and source kind,
//! tolerantly normalizes whatever comes back, validates claimed practice
//! locations, merges fuzzy duplicates, scores confidence and hands the
//! survivors to a pluggable sink.
//!
//! # Design Philosophy
//!
//! - Source-shaped prompts, tolerant parsing: the source is never trusted
//!   to return clean JSON
//! - Malformed rows are skipped and counted, never fatal
//! - Heuristics are injectable config data, not hard-coded literals
//! - Library handles mechanics, app handles which cities and specialties
//!
//! # Usage
//!
//! ```rust,ignore
//! use discovery::{CityReference, DiscoveryConfig, DiscoveryEngine, MemorySink};
//! use discovery::testing::MockTextSource;
//!
//! let source = MockTextSource::new();
//! let sink = MemorySink::new();
//! let mut engine = DiscoveryEngine::new(
//!     source,
//!     sink.clone(),
//!     CityReference::bundled(),
//!     DiscoveryConfig::default(),
//! );
//!
//! let records = engine.search_city("Mumbai", "cardiologist").await?;
//! let sweep = engine.search_countrywide("epileptologist").await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (TextSource, RecordSink)
//! - [`types`] - Domain data types (DoctorRecord, CityInfo, configs)
//! - [`pipeline`] - The tiered discovery orchestrator
//! - [`sinks`] - Sink implementations (MemorySink, SqliteSink)
//! - [`testing`] - Mock implementations for testing

pub mod client;
pub mod dedupe;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod reference;
pub mod score;
pub mod sinks;
pub mod testing;
pub mod traits;
pub mod types;
pub mod validator;

// Re-export core types at crate root
pub use client::SourceClient;
pub use dedupe::DedupeEngine;
pub use error::{DiscoveryError, Result, SourceError, SourceResult};
pub use normalizer::{NormalizedBatch, RawEntry};
pub use pipeline::{DiscoveryEngine, SearchPhase};
pub use prompts::{QueryGenerator, SourceKind};
pub use reference::CityReference;
pub use score::confidence_score;
pub use traits::{RecordSink, TextSource};
pub use types::{
    CityInfo, CityTier, ClientConfig, DiscoveryConfig, DoctorRecord, HeuristicsConfig,
};
pub use validator::LocationValidator;

// Re-export sinks
pub use sinks::MemorySink;

#[cfg(feature = "sqlite")]
pub use sinks::SqliteSink;
