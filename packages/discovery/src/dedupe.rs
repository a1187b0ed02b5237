//! Fuzzy deduplication and merging of doctor records.
//!
//! The same doctor surfaces from several sources under slightly different
//! names ("Dr. John Doe" / "John Doe" / "Dr J. Doe"). [`DedupeEngine`]
//! collapses a batch down to one record per person, folding the weaker
//! record's evidence into the stronger one.

use std::cmp::Ordering;

use chrono::Utc;
use tracing::debug;

use crate::types::{DoctorRecord, HeuristicsConfig};

/// Similarity between two strings on a 0-100 scale.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Why two records were judged to be the same doctor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeReason {
    ExactName,
    TitleStripped,
    FuzzyCorroborated,
}

pub struct DedupeEngine {
    heuristics: HeuristicsConfig,
}

impl DedupeEngine {
    pub fn new(heuristics: HeuristicsConfig) -> Self {
        Self { heuristics }
    }

    /// Collapse duplicates within `records`, strongest survivor first.
    ///
    /// Records are ranked by rating, then review count, then location
    /// coverage; each survivor absorbs every later record it matches
    /// and is rescored on every merge. O(n^2) in the batch size, which
    /// stays small per city.
    pub fn dedupe(&self, mut records: Vec<DoctorRecord>) -> Vec<DoctorRecord> {
        records.sort_by(|a, b| strength(b, a));

        let mut survivors: Vec<DoctorRecord> = Vec::with_capacity(records.len());
        for candidate in records {
            let existing = survivors
                .iter_mut()
                .find_map(|s| self.merge_reason(s, &candidate).map(|r| (s, r)));
            match existing {
                Some((survivor, reason)) => {
                    debug!(
                        survivor = %survivor.name,
                        absorbed = %candidate.name,
                        ?reason,
                        "merging duplicate"
                    );
                    self.merge_into(survivor, candidate);
                }
                None => survivors.push(candidate),
            }
        }
        survivors
    }

    /// Decide whether `candidate` is the same doctor as `survivor`.
    fn merge_reason(&self, survivor: &DoctorRecord, candidate: &DoctorRecord) -> Option<MergeReason> {
        if survivor.normalized_name() == candidate.normalized_name() {
            return Some(MergeReason::ExactName);
        }
        if survivor.title_stripped_name() == candidate.title_stripped_name() {
            return Some(MergeReason::TitleStripped);
        }

        // Fuzzy match only applies within the same specialization and city,
        // and needs corroborating evidence before it merges.
        if survivor.specialization != candidate.specialization
            || survivor.city != candidate.city
        {
            return None;
        }
        let score = similarity(
            &survivor.title_stripped_name(),
            &candidate.title_stripped_name(),
        );
        if score < self.heuristics.similarity_threshold {
            return None;
        }
        if score >= self.heuristics.unconditional_similarity
            || self.share_location(survivor, candidate)
            || self.share_facility(survivor, candidate)
        {
            return Some(MergeReason::FuzzyCorroborated);
        }
        None
    }

    /// Any fuzzy-similar location pair corroborates a name match.
    fn share_location(&self, a: &DoctorRecord, b: &DoctorRecord) -> bool {
        a.locations.iter().any(|la| {
            b.locations.iter().any(|lb| {
                similarity(&la.to_lowercase(), &lb.to_lowercase())
                    >= self.heuristics.location_similarity_threshold
            })
        })
    }

    /// Both records naming the same facility keyword corroborates too.
    fn share_facility(&self, a: &DoctorRecord, b: &DoctorRecord) -> bool {
        self.heuristics.facility_keywords.iter().any(|keyword| {
            let hit = |r: &DoctorRecord| {
                r.locations
                    .iter()
                    .any(|loc| loc.to_lowercase().contains(keyword.as_str()))
            };
            hit(a) && hit(b)
        })
    }

    /// Fold `absorbed` into `survivor`.
    fn merge_into(&self, survivor: &mut DoctorRecord, absorbed: DoctorRecord) {
        // The side with more reviews carries the trustworthy numbers;
        // ties go to the higher rating.
        let absorbed_wins = absorbed.review_count > survivor.review_count
            || (absorbed.review_count == survivor.review_count
                && absorbed.rating > survivor.rating);
        if absorbed_wins {
            survivor.rating = absorbed.rating;
            survivor.review_count = absorbed.review_count;
        }

        for location in absorbed.locations {
            survivor.push_location(location, self.heuristics.location_similarity_threshold);
        }
        survivor
            .contributing_sources
            .extend(absorbed.contributing_sources);
        survivor.timestamp = Utc::now();
        survivor.confidence_score = crate::score::confidence_score(survivor);
    }
}

/// Total order on record strength: rating, then reviews, then coverage.
fn strength(a: &DoctorRecord, b: &DoctorRecord) -> Ordering {
    a.rating
        .total_cmp(&b.rating)
        .then(a.review_count.cmp(&b.review_count))
        .then(a.locations.len().cmp(&b.locations.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> DedupeEngine {
        DedupeEngine::new(HeuristicsConfig::default())
    }

    fn record(name: &str, rating: f64, reviews: u32, locations: &[&str]) -> DoctorRecord {
        DoctorRecord::new(name, "cardiologist", "Mumbai", "practo")
            .unwrap()
            .with_rating(rating)
            .with_reviews(reviews)
            .with_locations(locations.iter().copied(), 85.0)
    }

    #[test]
    fn test_similarity_scale() {
        assert_eq!(similarity("abc", "abc"), 100.0);
        assert!(similarity("john doe", "jon doe") > 85.0);
        assert!(similarity("john doe", "priya sharma") < 40.0);
    }

    #[test]
    fn test_exact_duplicate_is_idempotent() {
        let engine = engine();
        let r = record("Dr. John Doe", 4.5, 100, &["Hospital A"]);
        let merged = engine.dedupe(vec![r.clone(), r]);
        assert_eq!(merged.len(), 1);
        let again = engine.dedupe(merged.clone());
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn test_exact_duplicate_merge_is_order_insensitive() {
        let engine = engine();
        let a = record("Dr. John Doe", 4.5, 100, &["Hospital A"]);
        let b = record("Dr. John Doe", 4.5, 100, &["Hospital A"]);

        let ab = engine.dedupe(vec![a.clone(), b.clone()]);
        let ba = engine.dedupe(vec![b, a]);
        assert_eq!(ab.len(), 1);
        assert_eq!(ab[0].rating, ba[0].rating);
        assert_eq!(ab[0].review_count, ba[0].review_count);
        assert_eq!(ab[0].locations, ba[0].locations);
        assert_eq!(ab[0].contributing_sources, ba[0].contributing_sources);
    }

    #[test]
    fn test_exact_name_merges_across_cities() {
        let engine = engine();
        let mut b = record("Dr. John Doe", 4.0, 50, &["Clinic B"]);
        b.city = "Delhi".to_string();
        let merged = engine.dedupe(vec![
            record("Dr. John Doe", 4.8, 100, &["Clinic A"]),
            b,
        ]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_title_stripped_merge_keeps_stronger_numbers() {
        let engine = engine();
        let merged = engine.dedupe(vec![
            record("Dr. John Doe", 4.8, 150, &["Apollo Hospital, Bandra"]),
            record("John Doe", 4.5, 80, &["Lilavati Hospital"]),
        ]);
        assert_eq!(merged.len(), 1);
        let survivor = &merged[0];
        assert_eq!(survivor.name, "Dr. John Doe");
        assert_eq!(survivor.rating, 4.8);
        assert_eq!(survivor.review_count, 150);
        assert_eq!(survivor.locations.len(), 2);
    }

    #[test]
    fn test_fuzzy_match_needs_corroboration() {
        let engine = engine();
        // Similar names, disjoint unrelated locations: kept apart
        let kept = engine.dedupe(vec![
            record("Dr. Priya Sharma", 4.5, 100, &["12 Hill Road"]),
            record("Dr. Priya Sharrma", 4.2, 60, &["88 Linking Road"]),
        ]);
        assert_eq!(kept.len(), 2);

        // Same names, shared facility keyword: merged
        let merged = engine.dedupe(vec![
            record("Dr. Priya Sharma", 4.5, 100, &["Fortis Hospital, Mulund"]),
            record("Dr. Priya Sharrma", 4.2, 60, &["Fortis Hospital Mulund West"]),
        ]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_near_identical_names_merge_unconditionally() {
        let engine = engine();
        let merged = engine.dedupe(vec![
            record("Dr. Rajesh Krishnamurthyy", 4.5, 100, &["12 Hill Road"]),
            record("Dr. Rajesh Krishnamurthy", 4.2, 60, &["88 Linking Road"]),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].locations.len(), 2);
    }

    #[test]
    fn test_fuzzy_match_respects_specialization() {
        let engine = engine();
        let mut b = record("Dr. Priya Sharrma", 4.2, 60, &["Fortis Hospital, Mulund"]);
        b.specialization = "dermatologist".to_string();
        let kept = engine.dedupe(vec![
            record("Dr. Priya Sharma", 4.5, 100, &["Fortis Hospital, Mulund"]),
            b,
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_sources_accumulate() {
        let engine = engine();
        let mut b = record("John Doe", 4.5, 80, &["Apollo Hospital"]);
        b.seed_source = "justdial".to_string();
        b.contributing_sources = std::iter::once("justdial".to_string()).collect();
        let merged = engine.dedupe(vec![
            record("Dr. John Doe", 4.8, 150, &["Apollo Hospital"]),
            b,
        ]);
        assert_eq!(merged.len(), 1);
        let sources: Vec<_> = merged[0].contributing_sources.iter().cloned().collect();
        assert_eq!(sources, vec!["justdial".to_string(), "practo".to_string()]);
    }

    #[test]
    fn test_similar_locations_collapse_on_merge() {
        let engine = engine();
        let merged = engine.dedupe(vec![
            record("Dr. John Doe", 4.8, 150, &["Apollo Hospital, Bandra West"]),
            record("John Doe", 4.5, 80, &["Apollo Hospital, Bandra  West"]),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].locations.len(), 1);
    }
}
