//! Prompt construction for each source kind.
//!
//! Prompts ask the text source for a strict JSON array of
//! `{name, rating, reviews, location}` objects. Source kinds prone to
//! cross-city bleed (broad directory and social sweeps) get paired
//! variants carrying a negative-city-exclusion clause.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// One upstream query channel / prompt pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Practo directory listings
    Practo,
    /// JustDial directory listings
    Justdial,
    /// Broad medical-directory sweep
    General,
    /// Hospital-chain site directories
    Hospital,
    /// Review and recommendation platforms
    Social,
}

impl SourceKind {
    /// Every source kind, in fan-out order.
    pub fn all() -> [SourceKind; 5] {
        [
            SourceKind::Practo,
            SourceKind::Justdial,
            SourceKind::General,
            SourceKind::Hospital,
            SourceKind::Social,
        ]
    }

    /// Stable tag used in record `contributing_sources`.
    pub fn tag(&self) -> &'static str {
        match self {
            SourceKind::Practo => "practo",
            SourceKind::Justdial => "justdial",
            SourceKind::General => "general",
            SourceKind::Hospital => "hospital",
            SourceKind::Social => "social",
        }
    }

    /// Broad sweeps routinely return doctors from neighbouring metros.
    fn bleed_prone(&self) -> bool {
        matches!(self, SourceKind::General | SourceKind::Social)
    }

    fn description(&self) -> &'static str {
        match self {
            SourceKind::Practo => "Practo listings",
            SourceKind::Justdial => "JustDial listings",
            SourceKind::General => "medical directories",
            SourceKind::Hospital => "hospital websites",
            SourceKind::Social => "patient review platforms",
        }
    }

    fn query_templates(&self) -> &'static [&'static str] {
        match self {
            SourceKind::Practo => &[
                "site:practo.com {spec} doctors in {city}",
                "site:practo.com best {spec} in {city} reviews",
                "site:practo.com top {spec} {city} verified",
                "site:practo.com {spec} clinic {city}",
            ],
            SourceKind::Justdial => &[
                "site:justdial.com {spec} doctors in {city}",
                "site:justdial.com best {spec} in {city} reviews",
                "site:justdial.com top rated {spec} {city}",
                "site:justdial.com {spec} clinic {city}",
            ],
            SourceKind::General => &[
                "site:lybrate.com {spec} doctors in {city}",
                "site:credihealth.com {spec} doctors in {city}",
                "site:clinicspots.com {spec} doctors in {city}",
                "site:medindia.net {spec} doctors in {city}",
                "{spec} doctors in {city} reviews ratings",
                "best {spec} in {city}",
            ],
            SourceKind::Hospital => &[
                "site:apollohospitals.com {spec} doctors {city}",
                "site:fortishealthcare.com {spec} doctors {city}",
                "site:maxhealthcare.in {spec} doctors {city}",
                "site:manipalhospitals.com {spec} doctors {city}",
                "site:narayanahealth.org {spec} doctors {city}",
            ],
            SourceKind::Social => &[
                "best {spec} doctors {city} reviews",
                "site:ratemds.com {spec} {city}",
                "recommended {spec} in {city}",
            ],
        }
    }
}

/// Builds prompt batches per (city, specialization, source kind).
#[derive(Debug, Clone)]
pub struct QueryGenerator {
    /// Ceiling on prompts per source; overflow is randomly sampled
    max_per_source: usize,

    /// Other tracked major cities, used for negative-exclusion clauses
    exclusion_cities: Vec<String>,
}

impl QueryGenerator {
    /// Create a generator.
    ///
    /// `exclusion_cities` are the other tracked major cities named in
    /// negative-constraint prompt variants; the target city is filtered
    /// out at build time.
    pub fn new(max_per_source: usize, exclusion_cities: Vec<String>) -> Self {
        Self {
            max_per_source: max_per_source.max(1),
            exclusion_cities,
        }
    }

    /// Build the prompt batch for one (city, specialization, kind).
    pub fn prompts_for(&self, city: &str, specialization: &str, kind: SourceKind) -> Vec<String> {
        let mut prompts: Vec<String> = kind
            .query_templates()
            .iter()
            .map(|template| {
                let query = template
                    .replace("{spec}", specialization)
                    .replace("{city}", city);
                prompt_body(kind.description(), &query, city, specialization)
            })
            .collect();

        if kind.bleed_prone() {
            let exclusion = self.exclusion_clause(city);
            if !exclusion.is_empty() {
                let constrained: Vec<String> = prompts
                    .iter()
                    .map(|p| format!("{}\n{}", p, exclusion))
                    .collect();
                prompts.extend(constrained);
            }
        }

        // Random sampling, not truncation, so every template family keeps
        // a chance of surviving the ceiling.
        if prompts.len() > self.max_per_source {
            let mut rng = rand::thread_rng();
            prompts = prompts
                .choose_multiple(&mut rng, self.max_per_source)
                .cloned()
                .collect();
        }

        prompts
    }

    fn exclusion_clause(&self, target_city: &str) -> String {
        let target = target_city.to_lowercase();
        let others: Vec<&str> = self
            .exclusion_cities
            .iter()
            .filter(|c| c.to_lowercase() != target)
            .map(|c| c.as_str())
            .collect();
        if others.is_empty() {
            return String::new();
        }
        format!(
            "Strictly exclude doctors whose primary practice is in {}. \
             Only include doctors practicing in {}.",
            others.join(", "),
            target_city
        )
    }
}

/// Shared prompt body demanding a strict JSON array.
fn prompt_body(source_desc: &str, query: &str, city: &str, specialization: &str) -> String {
    format!(
        "Find information about {specialization} doctors in {city} from {source_desc}.\n\
         Search for: \"{query}\"\n\
         For each doctor found, extract these details if available:\n\
         - Name of the doctor (including title Dr.)\n\
         - Number of reviews (if mentioned)\n\
         - Rating or score (numerical value on a 5-point scale if possible)\n\
         - Location (specific clinic name, hospital, and area in {city})\n\
         \n\
         Format the output strictly as a JSON list of dictionaries with these \
         exact field names:\n\
         - name\n\
         - rating\n\
         - reviews\n\
         - location\n\
         \n\
         Include only doctors who are actively practicing in {city} and have \
         at least a rating or reviews."
    )
}
