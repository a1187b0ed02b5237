//! The canonical aggregated record for one discovered doctor.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dedupe::similarity;

/// One aggregated doctor profile.
///
/// Created by the pipeline once a normalized row carries a name plus a
/// rating or review signal and at least one validated address. Mutated only
/// by the merge engine (absorbing a duplicate) and the confidence scorer.
///
/// Invariant: no two entries in `locations` are fuzzy-similar above the
/// merge threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRecord {
    /// Display name, trimmed, never empty
    pub name: String,

    /// Rating on the canonical 0-5 scale
    pub rating: f64,

    /// Total review count
    pub review_count: u32,

    /// Medical specialization as searched
    pub specialization: String,

    /// Target city the record was discovered for
    pub city: String,

    /// Validated practice addresses, insertion-ordered, fuzzy-deduplicated
    pub locations: Vec<String>,

    /// The source kind that first produced this record
    pub seed_source: String,

    /// Every source kind that contributed data
    pub contributing_sources: BTreeSet<String>,

    /// Composite trust score in [0, 1], recomputed after every merge
    pub confidence_score: f64,

    /// Last time this record was created or absorbed data
    pub timestamp: DateTime<Utc>,
}

impl DoctorRecord {
    /// Create a record from validated fields.
    ///
    /// Returns `None` when the name is empty after trimming; rating is
    /// clamped into [0, 5].
    pub fn new(
        name: impl Into<String>,
        specialization: impl Into<String>,
        city: impl Into<String>,
        source: impl Into<String>,
    ) -> Option<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return None;
        }

        let source = source.into();
        let mut contributing_sources = BTreeSet::new();
        contributing_sources.insert(source.clone());

        Some(Self {
            name,
            rating: 0.0,
            review_count: 0,
            specialization: specialization.into(),
            city: city.into(),
            locations: Vec::new(),
            seed_source: source,
            contributing_sources,
            confidence_score: 0.0,
            timestamp: Utc::now(),
        })
    }

    /// Set the rating, clamped to the canonical 0-5 scale.
    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating.clamp(0.0, 5.0);
        self
    }

    /// Set the review count.
    pub fn with_reviews(mut self, reviews: u32) -> Self {
        self.review_count = reviews;
        self
    }

    /// Add locations, preserving the fuzzy-dedup invariant.
    pub fn with_locations(
        mut self,
        locations: impl IntoIterator<Item = impl Into<String>>,
        similarity_threshold: f64,
    ) -> Self {
        for loc in locations {
            self.push_location(loc.into(), similarity_threshold);
        }
        self
    }

    /// Append a location unless an existing one is fuzzy-similar to it.
    ///
    /// Returns true when the location was actually added.
    pub fn push_location(&mut self, location: String, similarity_threshold: f64) -> bool {
        let location = location.trim().to_string();
        if location.is_empty() {
            return false;
        }
        let duplicate = self
            .locations
            .iter()
            .any(|existing| similarity(existing, &location) >= similarity_threshold);
        if duplicate {
            return false;
        }
        self.locations.push(location);
        true
    }

    /// Lowercased, whitespace-collapsed form of the name for identity checks.
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Normalized name with professional titles removed.
    pub fn title_stripped_name(&self) -> String {
        strip_titles(&self.normalized_name())
    }

    /// Upsert key for sinks: normalized name plus seed source.
    pub fn sink_key(&self) -> String {
        format!("{}::{}", self.normalized_name(), self.seed_source)
    }
}

/// Lowercase and collapse internal whitespace.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Remove leading professional titles ("dr.", "prof.", ...) from an
/// already-normalized name.
pub fn strip_titles(normalized: &str) -> String {
    const TITLES: [&str; 4] = ["dr.", "dr", "prof.", "prof"];

    let mut rest = normalized;
    loop {
        let mut stripped = false;
        for title in TITLES {
            if let Some(tail) = rest.strip_prefix(title) {
                // Only strip when the title is a standalone token
                if let Some(tail) = tail.strip_prefix(' ') {
                    rest = tail.trim_start();
                    stripped = true;
                    break;
                }
            }
        }
        if !stripped {
            return rest.to_string();
        }
    }
}
