//! Read-only city reference table.
//!
//! Loaded once per engine from bundled or caller-supplied JSON and shared
//! freely afterwards; nothing here mutates.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::{DiscoveryError, Result};
use crate::types::city::{CityInfo, CityTier};

/// JSON file shape: `{"cities": [...]}`.
#[derive(Debug, Deserialize)]
struct CityFile {
    cities: Vec<CityInfo>,
}

/// Lookup table from city name/alias to tier and state metadata.
#[derive(Debug, Clone)]
pub struct CityReference {
    cities: Vec<CityInfo>,
    // lowercase name or alias -> index into `cities`
    index: HashMap<String, usize>,
}

impl CityReference {
    /// Build a reference from a list of cities.
    ///
    /// Fails when two cities claim the same name or alias.
    pub fn new(cities: Vec<CityInfo>) -> Result<Self> {
        let mut index = HashMap::new();
        for (i, city) in cities.iter().enumerate() {
            let mut keys = vec![city.name.to_lowercase()];
            keys.extend(city.aliases.iter().map(|a| a.to_lowercase()));
            for key in keys {
                if index.insert(key.clone(), i).is_some() {
                    return Err(DiscoveryError::Config {
                        reason: format!("duplicate city name or alias: {}", key),
                    });
                }
            }
        }
        Ok(Self { cities, index })
    }

    /// Parse a reference from JSON (`{"cities": [...]}`).
    pub fn from_json(json: &str) -> Result<Self> {
        let file: CityFile = serde_json::from_str(json)?;
        Self::new(file.cities)
    }

    /// The reference table bundled with the crate (Indian cities).
    pub fn bundled() -> Self {
        Self::from_json(include_str!("../data/cities.json"))
            .expect("bundled city table is valid")
    }

    /// Look up a city by name or alias, case-insensitive.
    pub fn lookup(&self, name_or_alias: &str) -> Option<&CityInfo> {
        let key = name_or_alias.trim().to_lowercase();
        self.index.get(&key).map(|&i| &self.cities[i])
    }

    /// All cities of one tier, in table order.
    pub fn cities_in_tier(&self, tier: CityTier) -> Vec<&CityInfo> {
        self.cities.iter().filter(|c| c.tier == tier).collect()
    }

    /// All capital cities.
    pub fn capitals(&self) -> Vec<&CityInfo> {
        self.cities.iter().filter(|c| c.is_capital).collect()
    }

    /// Satellite towns of a city, looked up by name or alias.
    pub fn satellites_of(&self, name_or_alias: &str) -> Option<&[String]> {
        self.lookup(name_or_alias)
            .map(|city| city.satellite_towns.as_slice())
    }

    /// Every tracked city.
    pub fn all(&self) -> &[CityInfo] {
        &self.cities
    }

    /// Number of tracked cities.
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}
