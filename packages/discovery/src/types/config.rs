//! Configuration for the discovery pipeline.
//!
//! Heuristic phrase and alias lists are configuration data rather than
//! hard-coded literals so tests (and non-Indian deployments) can tune them.

use serde::{Deserialize, Serialize};

use crate::prompts::SourceKind;

/// Settings for the source client's concurrency, throttling and retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Maximum in-flight source calls
    pub max_concurrent: usize,

    /// Proactive rate limit applied before each call
    pub requests_per_second: u32,

    /// Total attempts per prompt (first call + retries)
    pub max_attempts: u32,

    /// Base delay for exponential backoff
    pub base_backoff_ms: u64,

    /// Upper bound for any single backoff delay
    pub max_backoff_ms: u64,

    /// Per-call deadline; a call past this is cancelled
    pub call_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 8,
            requests_per_second: 10,
            max_attempts: 3,
            base_backoff_ms: 250,
            max_backoff_ms: 4_000,
            call_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Set the concurrency bound.
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max.max(1);
        self
    }

    /// Set the proactive rate limit.
    pub fn with_requests_per_second(mut self, rps: u32) -> Self {
        self.requests_per_second = rps.max(1);
        self
    }

    /// Set total attempts per prompt.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the per-call timeout in seconds.
    pub fn with_call_timeout_secs(mut self, secs: u64) -> Self {
        self.call_timeout_secs = secs;
        self
    }
}

/// Injectable phrase and keyword lists driving the location validator and
/// the merge engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// Generic phrases always rejected as addresses, even for rare specialties
    pub always_generic_phrases: Vec<String>,

    /// Additional generic phrases rejected for common specialties only
    pub generic_phrases: Vec<String>,

    /// Phrases that excuse another city's name appearing in an address
    pub travel_indicators: Vec<String>,

    /// Keywords indicating a concrete medical facility
    pub facility_keywords: Vec<String>,

    /// Specialties scarce enough to trade precision for recall
    pub rare_specialties: Vec<String>,

    /// Name similarity (0-100) at which two records become merge candidates
    pub similarity_threshold: f64,

    /// Name similarity at which a fuzzy match merges without location overlap
    pub unconditional_similarity: f64,

    /// Address similarity (0-100) treated as the same location
    pub location_similarity_threshold: f64,
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            always_generic_phrases: vec![
                "multiple locations".to_string(),
                "various locations".to_string(),
                "online".to_string(),
                "teleconsultation".to_string(),
                "video consultation".to_string(),
            ],
            generic_phrases: vec![
                "consultation".to_string(),
                "available at".to_string(),
                "visit for".to_string(),
                "pan india".to_string(),
                "all over".to_string(),
                "near".to_string(),
                "opposite".to_string(),
            ],
            travel_indicators: vec![
                "visit".to_string(),
                "visiting".to_string(),
                "also available in".to_string(),
                "also practices in".to_string(),
                "on call in".to_string(),
            ],
            facility_keywords: vec![
                "hospital".to_string(),
                "clinic".to_string(),
                "medical center".to_string(),
                "medical centre".to_string(),
                "institute".to_string(),
                "nursing home".to_string(),
                "apollo".to_string(),
                "fortis".to_string(),
                "manipal".to_string(),
                "max healthcare".to_string(),
                "medanta".to_string(),
                "narayana".to_string(),
                "aiims".to_string(),
            ],
            rare_specialties: vec![
                "pediatric oncologist".to_string(),
                "epileptologist".to_string(),
                "hepatologist".to_string(),
                "neonatologist".to_string(),
                "geriatrician".to_string(),
            ],
            similarity_threshold: 85.0,
            unconditional_similarity: 95.0,
            location_similarity_threshold: 85.0,
        }
    }
}

impl HeuristicsConfig {
    /// Check whether a specialization gets the lenient generic-phrase set.
    pub fn is_rare_specialty(&self, specialization: &str) -> bool {
        let specialization = specialization.trim().to_lowercase();
        self.rare_specialties
            .iter()
            .any(|rare| rare.to_lowercase() == specialization)
    }

    /// Check whether an address is one of the always-rejected generic phrases.
    pub fn is_always_generic(&self, address: &str) -> bool {
        let address = address.to_lowercase();
        self.always_generic_phrases
            .iter()
            .any(|phrase| address.contains(phrase.as_str()))
    }

    /// Check whether an address is generic for a common specialty.
    pub fn is_generic(&self, address: &str) -> bool {
        if self.is_always_generic(address) {
            return true;
        }
        let address = address.to_lowercase();
        self.generic_phrases
            .iter()
            .any(|phrase| address.contains(phrase.as_str()))
    }

    /// Check whether an address names a concrete medical facility.
    pub fn has_facility_keyword(&self, address: &str) -> bool {
        let address = address.to_lowercase();
        self.facility_keywords
            .iter()
            .any(|keyword| address.contains(keyword.as_str()))
    }

    /// Check whether an address carries a travel-indicator phrase.
    pub fn has_travel_indicator(&self, address: &str) -> bool {
        let address = address.to_lowercase();
        self.travel_indicators
            .iter()
            .any(|phrase| address.contains(phrase.as_str()))
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Source client settings
    pub client: ClientConfig,

    /// Validator and merge-engine heuristics
    pub heuristics: HeuristicsConfig,

    /// Source kinds queried for each city
    pub source_kinds: Vec<SourceKind>,

    /// Ceiling on prompts per (city, source); excess is randomly sampled
    pub max_prompts_per_source: usize,

    /// Fixed pause between cities inside one tier
    pub inter_city_delay_ms: u64,

    /// Cities sampled from tier 2 during a sweep
    pub tier2_sample: usize,

    /// Cities sampled from tier 3 during a sweep
    pub tier3_sample: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            heuristics: HeuristicsConfig::default(),
            source_kinds: SourceKind::all().to_vec(),
            max_prompts_per_source: 8,
            inter_city_delay_ms: 500,
            tier2_sample: 5,
            tier3_sample: 3,
        }
    }
}

impl DiscoveryConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client settings.
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// Set the heuristics.
    pub fn with_heuristics(mut self, heuristics: HeuristicsConfig) -> Self {
        self.heuristics = heuristics;
        self
    }

    /// Restrict the source kinds queried.
    pub fn with_source_kinds(mut self, kinds: impl IntoIterator<Item = SourceKind>) -> Self {
        self.source_kinds = kinds.into_iter().collect();
        self
    }

    /// Set the prompt ceiling per source.
    pub fn with_max_prompts_per_source(mut self, max: usize) -> Self {
        self.max_prompts_per_source = max.max(1);
        self
    }

    /// Set the inter-city delay.
    pub fn with_inter_city_delay_ms(mut self, ms: u64) -> Self {
        self.inter_city_delay_ms = ms;
        self
    }

    /// Set tier 2/3 sample sizes for sweeps.
    pub fn with_tier_samples(mut self, tier2: usize, tier3: usize) -> Self {
        self.tier2_sample = tier2;
        self.tier3_sample = tier3;
        self
    }
}
