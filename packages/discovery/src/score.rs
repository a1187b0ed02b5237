//! Confidence scoring for aggregated records.
//!
//! The score is a deterministic blend of four saturating signals. It
//! orders the final output within a city; no behavior hangs off any
//! particular threshold.

use crate::types::DoctorRecord;

const RATING_WEIGHT: f64 = 0.35;
const REVIEW_WEIGHT: f64 = 0.25;
const SOURCE_WEIGHT: f64 = 0.20;
const LOCATION_WEIGHT: f64 = 0.20;

/// Reviews saturate the signal at this count.
const REVIEW_SATURATION: f64 = 1000.0;
const SOURCE_SATURATION: f64 = 3.0;
const LOCATION_SATURATION: f64 = 3.0;

/// Compute the confidence score for one record, in [0, 1].
pub fn confidence_score(record: &DoctorRecord) -> f64 {
    let rating = rating_band(record.rating);
    let reviews = (f64::from(record.review_count) / REVIEW_SATURATION).min(1.0);
    let sources = (record.contributing_sources.len() as f64 / SOURCE_SATURATION).min(1.0);
    let locations = (record.locations.len() as f64 / LOCATION_SATURATION).min(1.0);

    rating * RATING_WEIGHT
        + reviews * REVIEW_WEIGHT
        + sources * SOURCE_WEIGHT
        + locations * LOCATION_WEIGHT
}

/// Piecewise rating signal. Banded rather than linear so that the gap
/// between a 3.0 and a 4.5 practice outweighs noise within a band.
fn rating_band(rating: f64) -> f64 {
    if rating >= 4.5 {
        1.0
    } else if rating >= 4.0 {
        0.8
    } else if rating >= 3.5 {
        0.6
    } else if rating >= 3.0 {
        0.4
    } else {
        0.2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(rating: f64, reviews: u32, sources: usize, locations: usize) -> DoctorRecord {
        let mut r = DoctorRecord::new("Dr. A", "cardiologist", "Mumbai", "practo")
            .unwrap()
            .with_rating(rating)
            .with_reviews(reviews);
        for i in 0..sources {
            r.contributing_sources.insert(format!("source-{i}"));
        }
        for i in 0..locations {
            r.locations.push(format!("Clinic {i}"));
        }
        r
    }

    #[test]
    fn test_maximal_record_scores_one() {
        let r = record(5.0, 2000, 4, 5);
        assert!((confidence_score(&r) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(rating_band(4.5), 1.0);
        assert_eq!(rating_band(4.49), 0.8);
        assert_eq!(rating_band(4.0), 0.8);
        assert_eq!(rating_band(3.5), 0.6);
        assert_eq!(rating_band(3.0), 0.4);
        assert_eq!(rating_band(0.0), 0.2);
    }

    #[test]
    fn test_known_blend() {
        // rating 4.8 -> 1.0; 150 reviews -> 0.15; 2 sources -> 2/3; 2 locations -> 2/3
        let r = record(4.8, 150, 1, 2);
        let expected = 1.0 * 0.35 + 0.15 * 0.25 + (2.0 / 3.0) * 0.20 + (2.0 / 3.0) * 0.20;
        assert!((confidence_score(&r) - expected).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_score_within_unit_interval(
            rating in 0.0f64..=5.0,
            reviews in 0u32..5000,
            sources in 1usize..6,
            locations in 0usize..8,
        ) {
            let score = confidence_score(&record(rating, reviews, sources, locations));
            prop_assert!((0.0..=1.0).contains(&score));
        }

        #[test]
        fn prop_more_reviews_never_lower_score(
            rating in 0.0f64..=5.0,
            reviews in 0u32..5000,
            extra in 1u32..1000,
        ) {
            let base = confidence_score(&record(rating, reviews, 1, 1));
            let bumped = confidence_score(&record(rating, reviews + extra, 1, 1));
            prop_assert!(bumped >= base);
        }
    }
}
