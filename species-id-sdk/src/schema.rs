//! Identification result schema
//!
//! Field names serialize in snake_case, matching what the backend is asked
//! to produce. Every collection defaults to empty so a result is always
//! fully shaped, even when nothing was identified.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const REJECTED_IMAGE_EN: &str =
    "Image quality too low or no snake detected. Please try a clearer photo.";
const REJECTED_IMAGE_TH: &str = "คุณภาพภาพไม่ดีหรือไม่พบงู โปรดลองถ่ายรูปที่ชัดเจนขึ้น";

/// How dangerous the species is to people
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DangerLevel {
    /// Harmless
    #[default]
    Safe,
    /// Mildly venomous or defensive
    Moderate,
    /// Medically significant
    High,
    /// Potentially lethal
    Critical,
}

impl FromStr for DangerLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "safe" => Ok(DangerLevel::Safe),
            "moderate" => Ok(DangerLevel::Moderate),
            "high" => Ok(DangerLevel::High),
            "critical" => Ok(DangerLevel::Critical),
            other => Err(format!("unknown danger level: {}", other)),
        }
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DangerLevel::Safe => "Safe",
            DangerLevel::Moderate => "Moderate",
            DangerLevel::High => "High",
            DangerLevel::Critical => "Critical",
        };
        f.write_str(name)
    }
}

/// A country where the species occurs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Country or region name
    pub country: String,
    /// Two letter continent code (AS, AF, NA, SA, EU, OC)
    pub continent_code: String,
}

/// User-facing text for one language
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizedFields {
    /// Common name
    pub name: String,
    /// Plain-language description
    pub description: String,
    /// First aid steps
    pub first_aid: Vec<String>,
    /// Venom and toxicity explanation
    pub toxicity_details: String,
    /// Fun fact
    pub fun_fact: String,
    /// Where it lives
    pub habitat_text: String,
}

/// Field guide details for one language
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesDetail {
    /// Binomial name
    pub scientific_name: String,
    /// Taxonomic family
    pub family: String,
    /// Common Thai names
    pub thai_names: Vec<String>,
    /// Alternative names
    pub other_names: Vec<String>,
    /// Geographic range
    pub range: String,
    /// Habitat
    pub habitat: String,
    /// Diurnal, nocturnal or crepuscular
    pub active_time: String,
    /// Diet
    pub diet: String,
    /// Venom type and clinical effects
    pub venom_toxicity: String,
    /// Danger assessment
    pub danger_to_humans: String,
    /// How to avoid encounters and bites
    pub prevention: String,
    /// Typical behavior
    pub behavior: String,
}

/// Validated identification result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentificationResult {
    /// Whether a species was confidently identified
    pub found: bool,
    /// The backend asked for a clearer photo or more detail
    pub needs_clarification: bool,
    /// Follow-up suggestions for the user
    pub suggestions: Vec<String>,
    /// Similar species worth considering
    pub related_species: Vec<String>,
    /// Binomial name
    pub scientific_name: String,
    /// Certainty in `[0, 100]`
    pub confidence: f64,
    /// Whether the species is venomous
    pub is_venomous: bool,
    /// Danger to people
    pub danger_level: DangerLevel,
    /// Up to 8 countries where it occurs
    pub locations: Vec<Location>,
    /// Web search term for the species
    pub search_term: String,
    /// Localized text, keyed by language code
    pub data: BTreeMap<String, LocalizedFields>,
    /// Localized field guide details, keyed by language code
    pub details: BTreeMap<String, SpeciesDetail>,
}

impl IdentificationResult {
    /// A not-found result carrying empty entries for every language
    pub fn empty<S: AsRef<str>>(languages: &[S]) -> Self {
        let mut result = Self::default();
        result.ensure_languages(languages);
        result
    }

    /// A not-found result explaining that the photo was rejected. Languages
    /// without a translation get the English message.
    pub fn rejected_image<S: AsRef<str>>(languages: &[S]) -> Self {
        let mut result = Self::empty(languages);
        for (lang, fields) in result.data.iter_mut() {
            fields.description = match lang.as_str() {
                "th" => REJECTED_IMAGE_TH,
                _ => REJECTED_IMAGE_EN,
            }
            .to_string();
        }
        result
    }

    /// Insert empty `data`/`details` entries for any missing language
    pub fn ensure_languages<S: AsRef<str>>(&mut self, languages: &[S]) {
        for lang in languages {
            let lang = lang.as_ref();
            self.data.entry(lang.to_string()).or_default();
            self.details.entry(lang.to_string()).or_default();
        }
    }

    /// Localized text for `lang`
    pub fn localized(&self, lang: &str) -> Option<&LocalizedFields> {
        self.data.get(lang)
    }

    /// Field guide details for `lang`
    pub fn detail(&self, lang: &str) -> Option<&SpeciesDetail> {
        self.details.get(lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_danger_level_parsing() {
        assert_eq!("critical".parse::<DangerLevel>(), Ok(DangerLevel::Critical));
        assert_eq!(" High ".parse::<DangerLevel>(), Ok(DangerLevel::High));
        assert!("lethal".parse::<DangerLevel>().is_err());
        assert_eq!(DangerLevel::Moderate.to_string(), "Moderate");
    }

    #[test]
    fn test_empty_has_every_language() {
        let result = IdentificationResult::empty(&["en", "th"]);
        assert!(!result.found);
        assert_eq!(result.data.len(), 2);
        assert_eq!(result.details.len(), 2);
        assert_eq!(result.localized("th"), Some(&LocalizedFields::default()));
    }

    #[test]
    fn test_rejected_image_is_localized() {
        let result = IdentificationResult::rejected_image(&["en", "th", "ja"]);
        assert!(!result.found);
        assert_eq!(result.confidence, 0.0);
        assert!(result.data["en"].description.contains("clearer photo"));
        assert!(result.data["th"].description.contains("ไม่พบงู"));
        assert_eq!(result.data["ja"].description, result.data["en"].description);
        assert_eq!(result.details.len(), 3);
    }

    #[test]
    fn test_serializes_snake_case() {
        let value = serde_json::to_value(IdentificationResult::empty(&["en"])).unwrap();
        assert!(value.get("is_venomous").is_some());
        assert!(value.get("needs_clarification").is_some());
        assert_eq!(value["danger_level"], "Safe");
        assert!(value["details"]["en"].get("venom_toxicity").is_some());
    }
}
