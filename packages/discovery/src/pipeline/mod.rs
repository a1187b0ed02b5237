//! The discovery orchestrator.

mod engine;

pub use engine::{DiscoveryEngine, SearchPhase};
