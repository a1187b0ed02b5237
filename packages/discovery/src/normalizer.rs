//! Tolerant normalization of freeform source responses.
//!
//! Sources return anything from clean JSON to prose-wrapped, fenced,
//! half-structured text. Everything funnels through [`extract`], which
//! never fails: garbage in, empty batch out. Untyped JSON maps never
//! leave this module; rows are resolved into [`RawEntry`] via the field
//! alias tables at ingest.

use serde_json::Value;
use tracing::debug;

/// Historical spellings observed per logical field across sources.
const NAME_ALIASES: [&str; 4] = ["name", "Full Name", "Name", "doctor_name"];
const RATING_ALIASES: [&str; 4] = ["rating", "Rating or Score", "Rating", "Score"];
const REVIEW_ALIASES: [&str; 5] = [
    "reviews",
    "Number of reviews",
    "Number of Reviews",
    "Total Reviews",
    "review_count",
];
const LOCATION_ALIASES: [&str; 5] = ["location", "locations", "Location", "Address", "Clinic"];
const EXPERIENCE_ALIASES: [&str; 3] = ["experience", "Years of experience", "Experience"];
const FEES_ALIASES: [&str; 3] = ["fees", "Consultation fees", "Fees"];
const QUALIFICATION_ALIASES: [&str; 2] = ["qualifications", "Qualifications"];

/// One row after alias resolution and numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    /// Doctor name, trimmed, non-empty
    pub name: String,

    /// Rating on the canonical 0-5 scale
    pub rating: f64,

    /// Review count
    pub reviews: u32,

    /// Claimed addresses, trimmed, possibly empty
    pub locations: Vec<String>,

    /// Practice experience as stated by the source, e.g. "15+ years"
    pub experience: Option<String>,

    /// Consultation fees as stated by the source
    pub fees: Option<String>,

    /// Degrees and qualifications, list-joined when the source sends one
    pub qualifications: Option<String>,
}

impl RawEntry {
    /// A row is minimally valid when it carries a rating or review signal.
    pub fn has_signal(&self) -> bool {
        self.rating > 0.0 || self.reviews > 0
    }
}

/// Result of normalizing one raw response.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Rows that resolved to a named entry
    pub entries: Vec<RawEntry>,

    /// Rows skipped for missing name or wrong shape
    pub skipped_rows: usize,
}

/// Extract structured rows from a raw source response.
///
/// Handles fenced ```json blocks, bare arrays, arrays buried in prose,
/// and unparseable text (empty batch). Never errors.
pub fn extract(raw: &str) -> NormalizedBatch {
    let Some(json_str) = locate_json_array(raw) else {
        debug!("no JSON array found in response");
        return NormalizedBatch::default();
    };

    let values: Vec<Value> = match serde_json::from_str(json_str) {
        Ok(Value::Array(items)) => items,
        Ok(other) => vec![other],
        Err(err) => {
            debug!(error = %err, "response array failed to parse");
            return NormalizedBatch::default();
        }
    };

    let mut batch = NormalizedBatch::default();
    for value in values {
        match entry_from_value(&value) {
            Some(entry) => batch.entries.push(entry),
            None => batch.skipped_rows += 1,
        }
    }
    batch
}

/// Find the JSON array inside a possibly prose- or fence-wrapped response.
fn locate_json_array(raw: &str) -> Option<&str> {
    // Fenced code block takes priority
    if let Some(after_fence) = raw.split("```json").nth(1) {
        let inner = after_fence.split("```").next().unwrap_or(after_fence);
        return Some(inner.trim());
    }

    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        return Some(trimmed);
    }

    // Last resort: first '[' to last ']'
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end > start {
        Some(&raw[start..=end])
    } else {
        None
    }
}

/// Resolve one JSON object into a `RawEntry` via the alias tables.
fn entry_from_value(value: &Value) -> Option<RawEntry> {
    let obj = value.as_object()?;

    let name = NAME_ALIASES
        .iter()
        .find_map(|key| obj.get(*key))
        .and_then(value_as_text)
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())?;

    let rating = RATING_ALIASES
        .iter()
        .find_map(|key| obj.get(*key))
        .and_then(value_as_text)
        .map(|raw| normalize_rating(&raw))
        .unwrap_or(0.0);

    let reviews = REVIEW_ALIASES
        .iter()
        .find_map(|key| obj.get(*key))
        .and_then(value_as_text)
        .map(|raw| normalize_reviews(&raw))
        .unwrap_or(0);

    let locations = LOCATION_ALIASES
        .iter()
        .find_map(|key| obj.get(*key))
        .map(value_as_locations)
        .unwrap_or_default();

    let experience = optional_text(obj, &EXPERIENCE_ALIASES);
    let fees = optional_text(obj, &FEES_ALIASES);
    // Qualifications often arrive as a list of degrees
    let qualifications = QUALIFICATION_ALIASES
        .iter()
        .find_map(|key| obj.get(*key))
        .and_then(|value| match value {
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");
                (!joined.is_empty()).then_some(joined)
            }
            other => value_as_text(other).map(|s| s.trim().to_string()),
        })
        .filter(|s| !s.is_empty());

    Some(RawEntry {
        name,
        rating,
        reviews,
        locations,
        experience,
        fees,
        qualifications,
    })
}

/// Resolve an optional scalar field through its alias table.
fn optional_text(obj: &serde_json::Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|key| obj.get(*key))
        .and_then(value_as_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Render scalar JSON values as text for the coercion helpers.
fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(_) | Value::Null => None,
        // An array of scalars reads as its first element (e.g. ["4.5"])
        Value::Array(items) => items.first().and_then(value_as_text),
        Value::Object(_) => None,
    }
}

/// A location field may be one string or a list of strings.
fn value_as_locations(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                vec![]
            } else {
                vec![s.to_string()]
            }
        }
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        _ => vec![],
    }
}

/// Coerce a raw rating string onto the canonical 0-5 scale.
///
/// Conventions reconciled deterministically:
/// - "4.5", "4.5/5", "4.5 out of 5.0", "4.5 stars" -> 4.5
/// - "9/10", "9 out of 10", bare values in (5, 10]   -> halved
/// - "92%"                                           -> 92/100 of 5 = 4.6
/// - anything unparseable                            -> 0.0
pub fn normalize_rating(raw: &str) -> f64 {
    let cleaned = raw.trim().to_lowercase();
    if cleaned.is_empty() {
        return 0.0;
    }

    let value = if let Some(percent) = cleaned.strip_suffix('%') {
        match leading_number(percent) {
            Some(pct) => pct / 20.0,
            None => return 0.0,
        }
    } else if cleaned.contains("/10") || cleaned.contains("out of 10") {
        match leading_number(&cleaned) {
            Some(v) => v / 2.0,
            None => return 0.0,
        }
    } else {
        // "/5", "out of 5", "stars" and bare values all parse the same way
        match leading_number(&cleaned) {
            Some(v) if v > 5.0 && v <= 10.0 => v / 2.0,
            Some(v) => v,
            None => return 0.0,
        }
    };

    round1(value.clamp(0.0, 5.0))
}

/// Coerce a raw review-count string: keep digits, parse, default 0.
pub fn normalize_reviews(raw: &str) -> u32 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Parse the leading decimal number out of a string ("4.5 stars" -> 4.5).
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse().ok()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
