//! Tiered orchestration over the source, validator, merge engine and sink.

use std::time::Duration;

use rand::seq::SliceRandom;
use tracing::{info, warn};

use crate::client::SourceClient;
use crate::dedupe::DedupeEngine;
use crate::error::{DiscoveryError, Result};
use crate::normalizer;
use crate::prompts::QueryGenerator;
use crate::reference::CityReference;
use crate::score::confidence_score;
use crate::traits::{RecordSink, TextSource};
use crate::types::{CityInfo, CityTier, DiscoveryConfig, DoctorRecord};
use crate::validator::LocationValidator;

/// Pipeline stages, recorded in order as a run progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    FetchingCity,
    FetchingTier1,
    FetchingTier2,
    FetchingTier3,
    Deduplicating,
    Persisted,
    Done,
}

impl SearchPhase {
    fn for_tier(tier: CityTier) -> Self {
        match tier {
            CityTier::Metro => SearchPhase::FetchingTier1,
            CityTier::Tier2 => SearchPhase::FetchingTier2,
            CityTier::Tier3 => SearchPhase::FetchingTier3,
        }
    }
}

/// End-to-end discovery pipeline.
///
/// Owns one rate-limited source client and one sink, and drives the
/// fetch -> normalize -> validate -> dedupe -> score -> persist chain
/// for single cities, tiers and countrywide sweeps. Searches take
/// `&mut self` so a run's phase trace and working set stay inspectable
/// afterwards.
pub struct DiscoveryEngine<S: TextSource, K: RecordSink> {
    client: SourceClient<S>,
    sink: K,
    reference: CityReference,
    config: DiscoveryConfig,
    generator: QueryGenerator,
    validator: LocationValidator,
    dedupe: DedupeEngine,
    phases: Vec<SearchPhase>,
    last_records: Vec<DoctorRecord>,
}

impl<S: TextSource, K: RecordSink> DiscoveryEngine<S, K> {
    pub fn new(source: S, sink: K, reference: CityReference, config: DiscoveryConfig) -> Self {
        let exclusion_cities = reference
            .all()
            .iter()
            .map(|city| city.name.clone())
            .collect();
        let generator = QueryGenerator::new(config.max_prompts_per_source, exclusion_cities);
        let validator = LocationValidator::new(config.heuristics.clone(), &reference);
        let dedupe = DedupeEngine::new(config.heuristics.clone());
        Self {
            client: SourceClient::new(source, config.client.clone()),
            sink,
            reference,
            config,
            generator,
            validator,
            dedupe,
            phases: vec![SearchPhase::Idle],
            last_records: Vec::new(),
        }
    }

    /// Discover doctors of one specialization in one city.
    ///
    /// Returns records sorted by confidence, best first. Fails with
    /// [`DiscoveryError::CityNotFound`] when the city is not in the
    /// reference table; an empty result for a known city is not an error.
    pub async fn search_city(
        &mut self,
        city: &str,
        specialization: &str,
    ) -> Result<Vec<DoctorRecord>> {
        self.phases = vec![SearchPhase::Idle];
        let city = self
            .reference
            .lookup(city)
            .cloned()
            .ok_or_else(|| DiscoveryError::CityNotFound {
                name: city.to_string(),
            })?;

        self.phases.push(SearchPhase::FetchingCity);
        let gathered = self.gather_city(&city, specialization).await;
        self.finalize(gathered).await
    }

    /// Discover doctors across every (sampled) city of one tier.
    pub async fn search_tier(
        &mut self,
        tier: CityTier,
        specialization: &str,
    ) -> Result<Vec<DoctorRecord>> {
        self.phases = vec![SearchPhase::Idle];
        let gathered = self.gather_tier(tier, specialization).await;
        self.finalize(gathered).await
    }

    /// Sweep all tiers in order, then dedupe and persist once globally.
    pub async fn search_countrywide(&mut self, specialization: &str) -> Result<Vec<DoctorRecord>> {
        self.phases = vec![SearchPhase::Idle];
        let mut gathered = Vec::new();
        for tier in CityTier::all() {
            gathered.extend(self.gather_tier(tier, specialization).await);
        }
        self.finalize(gathered).await
    }

    /// Discover across a caller-chosen list of cities.
    ///
    /// Unrecognized names are logged and skipped; the call only fails
    /// when none of them resolve.
    pub async fn search_custom_cities(
        &mut self,
        cities: &[String],
        specialization: &str,
    ) -> Result<Vec<DoctorRecord>> {
        self.phases = vec![SearchPhase::Idle];
        let resolved: Vec<CityInfo> = cities
            .iter()
            .filter_map(|name| match self.reference.lookup(name) {
                Some(city) => Some(city.clone()),
                None => {
                    warn!(city = %name, "unknown city skipped");
                    None
                }
            })
            .collect();
        if resolved.is_empty() {
            return Err(DiscoveryError::CityNotFound {
                name: cities.first().cloned().unwrap_or_default(),
            });
        }

        self.phases.push(SearchPhase::FetchingCity);
        let gathered = self.gather_cities(&resolved, specialization).await;
        self.finalize(gathered).await
    }

    /// Phase transitions of the most recent run, in order.
    pub fn phase_trace(&self) -> &[SearchPhase] {
        &self.phases
    }

    /// The last run's final working set, kept even when the sink failed.
    pub fn last_records(&self) -> &[DoctorRecord] {
        &self.last_records
    }

    pub fn take_last_records(&mut self) -> Vec<DoctorRecord> {
        std::mem::take(&mut self.last_records)
    }

    async fn gather_tier(&mut self, tier: CityTier, specialization: &str) -> Vec<DoctorRecord> {
        self.phases.push(SearchPhase::for_tier(tier));
        let cities = self.reference.cities_in_tier(tier);

        // Tier 1 is exhaustive; lower tiers take a bounded random sample.
        let sample = match tier {
            CityTier::Metro => cities.len(),
            CityTier::Tier2 => self.config.tier2_sample,
            CityTier::Tier3 => self.config.tier3_sample,
        };
        let chosen: Vec<CityInfo> = cities
            .choose_multiple(&mut rand::thread_rng(), sample.min(cities.len()))
            .map(|city| (*city).clone())
            .collect();

        info!(?tier, cities = chosen.len(), "sweeping tier");
        self.gather_cities(&chosen, specialization).await
    }

    async fn gather_cities(
        &self,
        cities: &[CityInfo],
        specialization: &str,
    ) -> Vec<DoctorRecord> {
        let mut gathered = Vec::new();
        for (i, city) in cities.iter().enumerate() {
            if i > 0 && self.config.inter_city_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.inter_city_delay_ms)).await;
            }
            gathered.extend(self.gather_city(city, specialization).await);
        }
        gathered
    }

    /// Query every configured source kind for one city and build the raw
    /// (pre-dedupe) records. Source-level failures are absorbed per slot.
    async fn gather_city(&self, city: &CityInfo, specialization: &str) -> Vec<DoctorRecord> {
        let mut records = Vec::new();
        for kind in &self.config.source_kinds {
            let prompts = self
                .generator
                .prompts_for(&city.name, specialization, *kind);
            let responses = self.client.submit_batch(&prompts).await;

            let mut entries = 0usize;
            let mut skipped = 0usize;
            let mut failed_slots = 0usize;
            for result in responses {
                let raw = match result {
                    Ok(raw) => raw,
                    Err(err) => {
                        warn!(city = %city.name, source = kind.tag(), error = %err, "prompt slot failed");
                        failed_slots += 1;
                        continue;
                    }
                };
                let batch = normalizer::extract(&raw);
                skipped += batch.skipped_rows;
                for entry in batch.entries {
                    entries += 1;
                    if !entry.has_signal() {
                        continue;
                    }
                    let validated: Vec<String> = entry
                        .locations
                        .iter()
                        .filter(|loc| self.validator.is_in_city(loc, city, specialization))
                        .cloned()
                        .collect();
                    if validated.is_empty() {
                        continue;
                    }
                    let Some(record) = DoctorRecord::new(
                        &entry.name,
                        specialization,
                        &city.name,
                        kind.tag(),
                    ) else {
                        continue;
                    };
                    records.push(
                        record
                            .with_rating(entry.rating)
                            .with_reviews(entry.reviews)
                            .with_locations(
                                validated,
                                self.config.heuristics.location_similarity_threshold,
                            ),
                    );
                }
            }
            info!(
                city = %city.name,
                source = kind.tag(),
                entries,
                skipped,
                failed_slots,
                "source pass complete"
            );
        }
        records
    }

    /// Dedupe, score, sort and persist one run's gathered records.
    async fn finalize(&mut self, gathered: Vec<DoctorRecord>) -> Result<Vec<DoctorRecord>> {
        self.phases.push(SearchPhase::Deduplicating);
        let mut records = self.dedupe.dedupe(gathered);
        for record in &mut records {
            record.confidence_score = confidence_score(record);
        }
        records.sort_by(|a, b| b.confidence_score.total_cmp(&a.confidence_score));

        // The working set survives a sink failure for inspection/retry.
        self.last_records = records.clone();
        self.sink.persist(&records).await?;
        self.phases.push(SearchPhase::Persisted);
        self.phases.push(SearchPhase::Done);
        info!(records = records.len(), "run persisted");
        Ok(records)
    }
}
