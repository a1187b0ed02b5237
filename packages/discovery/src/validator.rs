//! Heuristic validation of claimed practice locations.
//!
//! Sources routinely attach a doctor's telehealth footprint, visiting
//! schedule or chain-wide presence to whichever city was asked about.
//! [`LocationValidator::is_in_city`] filters those claims down to
//! addresses plausibly inside the target city. Rules apply in a fixed
//! order; the first one that fires decides.

use tracing::debug;

use crate::reference::CityReference;
use crate::types::{CityInfo, HeuristicsConfig};

/// Stateless address checker, shareable across cities.
pub struct LocationValidator {
    heuristics: HeuristicsConfig,
    /// Lowercased names and aliases of every known city
    tracked_cities: Vec<String>,
}

impl LocationValidator {
    pub fn new(heuristics: HeuristicsConfig, reference: &CityReference) -> Self {
        let mut tracked_cities = Vec::new();
        for city in reference.all() {
            tracked_cities.push(city.name.to_lowercase());
            tracked_cities.extend(city.aliases.iter().map(|a| a.to_lowercase()));
        }
        Self {
            heuristics,
            tracked_cities,
        }
    }

    /// Decide whether `address` plausibly sits inside `city`.
    ///
    /// Rule order is load-bearing:
    /// 1. generic phrases reject (rare specialties get a reduced list)
    /// 2. target city name or alias accepts
    /// 3. satellite town accepts
    /// 4. a different tracked city rejects, unless phrased as travel
    /// 5. a facility keyword accepts
    /// 6. default accept
    pub fn is_in_city(&self, address: &str, city: &CityInfo, specialization: &str) -> bool {
        let address_lower = address.to_lowercase();
        if address_lower.trim().is_empty() {
            return false;
        }

        // 1. Generic / service-area phrasing carries no street address.
        // Rare specialties legitimately list multi-city practices, so
        // only the unconditional phrases apply to them.
        let generic = if self.heuristics.is_rare_specialty(specialization) {
            self.heuristics.is_always_generic(&address_lower)
        } else {
            self.heuristics.is_generic(&address_lower)
        };
        if generic {
            debug!(address, "rejected: generic phrasing");
            return false;
        }

        // 2. Explicit mention of the target city or one of its aliases.
        if address_lower.contains(&city.name.to_lowercase())
            || city
                .aliases
                .iter()
                .any(|alias| address_lower.contains(&alias.to_lowercase()))
        {
            return true;
        }

        // 3. Satellite towns count as in-city.
        if city
            .satellite_towns
            .iter()
            .any(|town| address_lower.contains(&town.to_lowercase()))
        {
            return true;
        }

        // 4. Another known city in the address means the practice is
        // elsewhere, unless the phrasing marks it as a visiting stint.
        let foreign_city = self
            .tracked_cities
            .iter()
            .filter(|tracked| !city.matches(tracked))
            .find(|tracked| contains_word(&address_lower, tracked));
        if let Some(foreign) = foreign_city {
            if self.heuristics.has_travel_indicator(&address_lower) {
                debug!(address, foreign, "kept: travel phrasing, home base assumed local");
            } else {
                debug!(address, foreign, "rejected: foreign city");
                return false;
            }
        }

        // 5. A named facility without contradicting city is good enough.
        if self.heuristics.has_facility_keyword(&address_lower) {
            return true;
        }

        // 6. A plain street address with no red flags passes.
        true
    }
}

/// Substring match on token boundaries.
///
/// Short city aliases ("ncr", "goa") would otherwise fire inside
/// unrelated words ("pancreatic", "goal").
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let begin = start + pos;
        let end = begin + needle.len();
        let boundary_before = begin == 0 || !bytes[begin - 1].is_ascii_alphanumeric();
        let boundary_after = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        if boundary_before && boundary_after {
            return true;
        }
        start = end;
    }
    false
}
