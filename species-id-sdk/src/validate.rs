//! Result validation
//!
//! The backend's JSON is untrusted free-form output. [`ResultValidator`]
//! walks it as an untyped [`Value`] so a wrong-typed or missing field falls
//! back to its default instead of failing the whole result, then applies
//! the confidence gate. This is the only place that policy is enforced.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::schema::{DangerLevel, IdentificationResult, LocalizedFields, Location, SpeciesDetail};

/// Results reporting less certainty than this are never `found`
pub const CONFIDENCE_THRESHOLD: f64 = 85.0;

/// Maximum number of locations kept on a result
pub const MAX_LOCATIONS: usize = 8;

/// Keys that mark `details` as a single flat record rather than a
/// per-language map
const FLAT_DETAIL_KEYS: &[&str] = &[
    "scientific_name",
    "family",
    "thai_names",
    "other_names",
    "range",
    "habitat",
    "active_time",
    "diet",
    "venom_toxicity",
    "danger_to_humans",
    "prevention",
    "behavior",
];

/// Turns parsed backend payloads into well-formed results
#[derive(Debug, Clone)]
pub struct ResultValidator {
    languages: Vec<String>,
}

impl ResultValidator {
    /// Validator guaranteeing entries for each of `languages`
    pub fn new<S: Into<String>>(languages: impl IntoIterator<Item = S>) -> Self {
        Self {
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    /// Configured language codes
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Build a result from a parsed payload. Never fails: a payload that is
    /// not an object yields the empty not-found result.
    pub fn validate(&self, parsed: &Value) -> IdentificationResult {
        let obj = match parsed.as_object() {
            Some(obj) => obj,
            None => return self.normalize(IdentificationResult::default()),
        };

        let search_term = match obj.get("search_term") {
            Some(value) if !text(Some(value)).is_empty() => text(Some(value)),
            _ => text(obj.get("google_search_term")),
        };

        let result = IdentificationResult {
            found: flag(obj.get("found")),
            needs_clarification: flag(obj.get("needs_clarification")),
            suggestions: string_list(obj.get("suggestions")),
            related_species: string_list(obj.get("related_species")),
            scientific_name: text(obj.get("scientific_name")),
            confidence: number(obj.get("confidence")).unwrap_or(0.0),
            is_venomous: flag(obj.get("is_venomous")),
            danger_level: danger_level(obj.get("danger_level")),
            locations: locations(obj.get("locations")),
            search_term,
            data: obj
                .get("data")
                .and_then(Value::as_object)
                .map(|map| {
                    map.iter()
                        .filter(|(_, v)| v.is_object())
                        .map(|(lang, v)| (lang.clone(), localized(v)))
                        .collect()
                })
                .unwrap_or_default(),
            details: self.details(obj.get("details")),
        };

        self.normalize(result)
    }

    /// Apply the confidence gate, clamp confidence, cap locations and fill
    /// in every configured language. Idempotent.
    pub fn normalize(&self, mut result: IdentificationResult) -> IdentificationResult {
        if !result.confidence.is_finite() {
            result.confidence = 0.0;
        }
        result.confidence = result.confidence.clamp(0.0, 100.0);

        if result.confidence < CONFIDENCE_THRESHOLD {
            result.found = false;
        }

        result.locations.truncate(MAX_LOCATIONS);
        result.ensure_languages(&self.languages);
        result
    }

    fn details(&self, value: Option<&Value>) -> BTreeMap<String, SpeciesDetail> {
        let map = match value.and_then(Value::as_object) {
            Some(map) => map,
            None => return Default::default(),
        };

        if FLAT_DETAIL_KEYS.iter().any(|key| map.contains_key(*key)) {
            let flat = detail_from(map);
            return self
                .languages
                .iter()
                .map(|lang| (lang.clone(), flat.clone()))
                .collect();
        }

        map.iter()
            .filter_map(|(lang, v)| v.as_object().map(|obj| (lang.clone(), detail_from(obj))))
            .collect()
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes"),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| text(Some(item)))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn danger_level(value: Option<&Value>) -> DangerLevel {
    value
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

fn locations(value: Option<&Value>) -> Vec<Location> {
    let items = match value.and_then(Value::as_array) {
        Some(items) => items,
        None => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => Some(Location {
                country: text(obj.get("country")),
                continent_code: text(obj.get("continent_code")).to_ascii_uppercase(),
            }),
            Value::String(country) if !country.trim().is_empty() => Some(Location {
                country: country.trim().to_string(),
                continent_code: String::new(),
            }),
            _ => None,
        })
        .collect()
}

fn localized(value: &Value) -> LocalizedFields {
    LocalizedFields {
        name: text(value.get("name")),
        description: text(value.get("description")),
        first_aid: string_list(value.get("first_aid")),
        toxicity_details: text(value.get("toxicity_details")),
        fun_fact: text(value.get("fun_fact")),
        habitat_text: text(value.get("habitat_text")),
    }
}

fn detail_from(obj: &Map<String, Value>) -> SpeciesDetail {
    SpeciesDetail {
        scientific_name: text(obj.get("scientific_name")),
        family: text(obj.get("family")),
        thai_names: string_list(obj.get("thai_names")),
        other_names: string_list(obj.get("other_names")),
        range: text(obj.get("range")),
        habitat: text(obj.get("habitat")),
        active_time: text(obj.get("active_time")),
        diet: text(obj.get("diet")),
        venom_toxicity: text(obj.get("venom_toxicity")),
        danger_to_humans: text(obj.get("danger_to_humans")),
        prevention: text(obj.get("prevention")),
        behavior: text(obj.get("behavior")),
    }
}
