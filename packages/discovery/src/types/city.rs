//! City reference types.

use serde::{Deserialize, Serialize};

/// Coarse city-size classification bounding search breadth.
///
/// Tier 1 cities are searched exhaustively during a countrywide sweep;
/// tiers 2 and 3 are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CityTier {
    /// Major metro
    Metro,
    /// Mid-size city
    Tier2,
    /// Small town
    Tier3,
}

impl CityTier {
    /// All tiers in sweep order.
    pub fn all() -> [CityTier; 3] {
        [CityTier::Metro, CityTier::Tier2, CityTier::Tier3]
    }
}

impl TryFrom<u8> for CityTier {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(CityTier::Metro),
            2 => Ok(CityTier::Tier2),
            3 => Ok(CityTier::Tier3),
            other => Err(format!("city tier must be 1, 2, or 3, got {}", other)),
        }
    }
}

impl From<CityTier> for u8 {
    fn from(tier: CityTier) -> u8 {
        match tier {
            CityTier::Metro => 1,
            CityTier::Tier2 => 2,
            CityTier::Tier3 => 3,
        }
    }
}

/// Immutable reference data for one tracked city.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityInfo {
    /// Canonical city name
    pub name: String,

    /// State the city belongs to
    pub state: String,

    /// Country (reference tables are per-country)
    #[serde(default = "default_country")]
    pub country: String,

    /// Size tier (1 = major metro, 3 = small town)
    pub tier: CityTier,

    /// Whether the city is a state capital
    #[serde(default)]
    pub is_capital: bool,

    /// Alternate spellings and historical names
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Metro-region towns treated as part of this city for validation
    #[serde(default)]
    pub satellite_towns: Vec<String>,
}

fn default_country() -> String {
    "India".to_string()
}

impl CityInfo {
    /// Create a new city entry.
    pub fn new(name: impl Into<String>, state: impl Into<String>, tier: CityTier) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
            country: default_country(),
            tier,
            is_capital: false,
            aliases: Vec::new(),
            satellite_towns: Vec::new(),
        }
    }

    /// Mark as a capital city.
    pub fn capital(mut self) -> Self {
        self.is_capital = true;
        self
    }

    /// Add alternate spellings.
    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases.extend(aliases.into_iter().map(|a| a.into()));
        self
    }

    /// Add metro-region satellite towns.
    pub fn with_satellites(mut self, towns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.satellite_towns
            .extend(towns.into_iter().map(|t| t.into()));
        self
    }

    /// Check whether a name matches this city (name or alias, case-insensitive).
    pub fn matches(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.name.to_lowercase() == name
            || self.aliases.iter().any(|a| a.to_lowercase() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_roundtrip() {
        for tier in CityTier::all() {
            let raw: u8 = tier.into();
            assert_eq!(CityTier::try_from(raw).unwrap(), tier);
        }
        assert!(CityTier::try_from(4).is_err());
        assert!(CityTier::try_from(0).is_err());
    }

    #[test]
    fn test_city_matches_alias() {
        let city = CityInfo::new("Mumbai", "Maharashtra", CityTier::Metro)
            .with_aliases(["Bombay"]);

        assert!(city.matches("mumbai"));
        assert!(city.matches("  Bombay "));
        assert!(!city.matches("Pune"));
    }
}
