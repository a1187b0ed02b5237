//! Integration tests for the full discovery pipeline.
//!
//! These tests drive the engine end to end against a mock text source:
//! 1. Fan prompts out per source kind
//! 2. Normalize messy responses
//! 3. Validate locations
//! 4. Merge duplicates and score
//! 5. Persist to a sink

use discovery::{
    testing::MockTextSource, CityReference, ClientConfig, DiscoveryConfig, DiscoveryEngine,
    MemorySink, SearchPhase, SourceKind,
};

fn fast_config() -> DiscoveryConfig {
    DiscoveryConfig::default()
        .with_client(
            ClientConfig::default()
                .with_requests_per_second(1000)
                .with_max_attempts(1),
        )
        .with_inter_city_delay_ms(0)
}

fn engine_with(
    source: MockTextSource,
    config: DiscoveryConfig,
) -> (DiscoveryEngine<MockTextSource, MemorySink>, MemorySink) {
    let sink = MemorySink::new();
    let engine = DiscoveryEngine::new(source, sink.clone(), CityReference::bundled(), config);
    (engine, sink)
}

#[tokio::test]
async fn test_cross_source_duplicate_merges_into_one_record() {
    // Practo and the general sweep return the same doctor under
    // slightly different names, ratings and locations.
    let source = MockTextSource::new()
        .with_response(
            "Practo",
            r#"```json
            [{"name": "Dr. John Doe", "rating": "4.8", "reviews": "150", "location": "Apollo Hospital, Bandra, Mumbai"}]
            ```"#,
        )
        .with_response(
            "medical directories",
            r#"Here is what I found: [{"Full Name": "John Doe", "Rating or Score": "4.5", "Number of Reviews": "80", "Address": "Lilavati Hospital, Mumbai"}]"#,
        );
    let config = fast_config().with_source_kinds([SourceKind::Practo, SourceKind::General]);
    let (mut engine, sink) = engine_with(source, config);

    let records = engine.search_city("Mumbai", "cardiologist").await.unwrap();
    assert_eq!(records.len(), 1);

    let doctor = &records[0];
    assert_eq!(doctor.name, "Dr. John Doe");
    assert_eq!(doctor.rating, 4.8);
    assert_eq!(doctor.review_count, 150);
    assert_eq!(doctor.locations.len(), 2);
    let sources: Vec<_> = doctor.contributing_sources.iter().cloned().collect();
    assert_eq!(sources, vec!["general".to_string(), "practo".to_string()]);
    assert!(doctor.confidence_score > 0.0);

    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_online_only_practice_is_dropped() {
    let source = MockTextSource::new().with_response(
        "Practo",
        r#"[
            {"name": "Dr. Remote", "rating": 4.9, "reviews": 500, "location": "Online consultation"},
            {"name": "Dr. Local", "rating": 4.1, "reviews": 40, "location": "Andheri West, Mumbai"}
        ]"#,
    );
    let config = fast_config().with_source_kinds([SourceKind::Practo]);
    let (mut engine, sink) = engine_with(source, config);

    let records = engine.search_city("Mumbai", "cardiologist").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Dr. Local");
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_foreign_city_listing_is_dropped() {
    let source = MockTextSource::new().with_response(
        "Mumbai",
        r#"[{"name": "Dr. Elsewhere", "rating": 4.7, "reviews": 300, "location": "Greams Road, Chennai"}]"#,
    );
    let (mut engine, sink) = engine_with(source, fast_config());

    let records = engine.search_city("Mumbai", "cardiologist").await.unwrap();
    assert!(records.is_empty());
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_signal_free_rows_are_dropped() {
    // A name with neither rating nor reviews carries no evidence.
    let source = MockTextSource::new().with_response(
        "Mumbai",
        r#"[{"name": "Dr. Ghost", "location": "Bandra, Mumbai"}]"#,
    );
    let (mut engine, _sink) = engine_with(source, fast_config());
    let records = engine.search_city("Mumbai", "cardiologist").await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_results_sorted_by_confidence() {
    let source = MockTextSource::new().with_response(
        "Practo",
        r#"[
            {"name": "Dr. Modest", "rating": 3.2, "reviews": 10, "location": "Dadar, Mumbai"},
            {"name": "Dr. Stellar", "rating": 4.9, "reviews": 900, "location": "Worli, Mumbai"}
        ]"#,
    );
    let config = fast_config().with_source_kinds([SourceKind::Practo]);
    let (mut engine, _sink) = engine_with(source, config);

    let records = engine.search_city("Mumbai", "cardiologist").await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "Dr. Stellar");
    assert!(records[0].confidence_score > records[1].confidence_score);
}

#[tokio::test]
async fn test_failed_source_does_not_poison_the_city() {
    // Every JustDial prompt fails; Practo still delivers.
    let source = MockTextSource::new()
        .with_failure("JustDial")
        .with_response(
            "Practo",
            r#"[{"name": "Dr. A", "rating": 4.0, "reviews": 25, "location": "Colaba, Mumbai"}]"#,
        );
    let config = fast_config().with_source_kinds([SourceKind::Practo, SourceKind::Justdial]);
    let (mut engine, _sink) = engine_with(source, config);

    let records = engine.search_city("Mumbai", "cardiologist").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Dr. A");
}

#[tokio::test]
async fn test_alias_lookup_resolves_city() {
    let source = MockTextSource::new().with_response(
        "Mumbai",
        r#"[{"name": "Dr. A", "rating": 4.0, "reviews": 25, "location": "Fort, Mumbai"}]"#,
    );
    let (mut engine, _sink) = engine_with(source, fast_config());

    // "Bombay" resolves to Mumbai; prompts are built for the canonical name.
    let records = engine.search_city("Bombay", "cardiologist").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].city, "Mumbai");
}

#[tokio::test]
async fn test_repeat_run_does_not_duplicate_sink_rows() {
    let source = MockTextSource::new().with_response(
        "Practo",
        r#"[{"name": "Dr. A", "rating": 4.0, "reviews": 25, "location": "Colaba, Mumbai"}]"#,
    );
    let config = fast_config().with_source_kinds([SourceKind::Practo]);
    let (mut engine, sink) = engine_with(source, config);

    engine.search_city("Mumbai", "cardiologist").await.unwrap();
    engine.search_city("Mumbai", "cardiologist").await.unwrap();
    assert_eq!(sink.len(), 1);
}

#[tokio::test]
async fn test_sweep_covers_tier_and_traces_phases() {
    let source = MockTextSource::new().with_response(
        "cardiologist",
        r#"[{"name": "Dr. A", "rating": 4.0, "reviews": 25, "location": "Fortis Hospital"}]"#,
    );
    let config = fast_config()
        .with_source_kinds([SourceKind::Practo])
        .with_tier_samples(1, 1);
    let (mut engine, sink) = engine_with(source, config);

    let records = engine.search_countrywide("cardiologist").await.unwrap();
    assert!(!records.is_empty());
    assert!(sink.len() >= 1);

    assert_eq!(
        engine.phase_trace(),
        &[
            SearchPhase::Idle,
            SearchPhase::FetchingTier1,
            SearchPhase::FetchingTier2,
            SearchPhase::FetchingTier3,
            SearchPhase::Deduplicating,
            SearchPhase::Persisted,
            SearchPhase::Done,
        ]
    );
}
