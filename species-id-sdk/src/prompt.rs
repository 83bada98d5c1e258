//! Prompt construction
//!
//! Every request is one user message. The herpetologist instruction leads,
//! followed by the image (for photos) and the task prompt.

use crate::backend::{ChatCompletionRequest, ChatMessage, ContentPart};
use crate::config::IdentifierConfig;
use crate::pool::ModelDescriptor;
use crate::request::IdentificationRequest;
use crate::validate::{CONFIDENCE_THRESHOLD, MAX_LOCATIONS};

/// Reply token meaning the photo shows an identifiable snake
pub const SNAKE_PRESENT: &str = "snake_present";

/// Reply token meaning the photo should be rejected
pub const NOT_A_SNAKE: &str = "not_a_snake";

/// Completion bound for the one-word pre-check reply
const PRECHECK_MAX_TOKENS: u32 = 16;

const IMAGE_PROMPT: &str = "Identify this snake with high accuracy. Analyze key identifying features:
- Head shape and size relative to body
- Scale patterns and arrangement
- Color and band patterns
- Eye position and pupil shape
- Specific regional species

Provide detailed field guide information.";

const RESPONSE_SHAPE: &str = r#"Respond with a single JSON object and nothing else, using exactly these snake_case keys:
{
  "found": boolean,
  "needs_clarification": boolean,
  "suggestions": [string],
  "related_species": [string],
  "scientific_name": string,
  "confidence": number from 0 to 100,
  "is_venomous": boolean,
  "danger_level": "Safe" | "Moderate" | "High" | "Critical",
  "locations": [{"country": string, "continent_code": "AS" | "AF" | "NA" | "SA" | "EU" | "OC"}],
  "search_term": string,
  "data": {"<lang>": {"name": string, "description": string, "first_aid": [string], "toxicity_details": string, "fun_fact": string, "habitat_text": string}},
  "details": {"<lang>": {"scientific_name": string, "family": string, "thai_names": [string], "other_names": [string], "range": string, "habitat": string, "active_time": string, "diet": string, "venom_toxicity": string, "danger_to_humans": string, "prevention": string, "behavior": string}}
}"#;

/// Builds chat completion requests for identification and pre-check calls
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    languages: Vec<String>,
    temperature: f32,
    max_tokens: u32,
}

impl PromptBuilder {
    /// Builder using the configured languages and sampling settings
    pub fn from_config(config: &IdentifierConfig) -> Self {
        Self {
            languages: config.languages.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// The expert instruction block sent ahead of every identification
    pub fn instruction(&self) -> String {
        let languages = self
            .languages
            .iter()
            .map(|code| format!("{} ({})", language_name(code), code))
            .collect::<Vec<_>>()
            .join(", ");
        let keys = self.languages.join(", ");

        format!(
            "You are an expert herpetologist specializing in Asian and global snake species, \
with the knowledge of a regional reptile field guide.

Rules:
1. Only identify if you are highly confident ({threshold}%+ certainty).
2. If confidence is below {threshold}, set \"found\" to false.
3. Use morphological features: head shape, scale patterns, color bands, size, eye position.
4. Consider regional context and prioritize species found in that region.
5. \"description\": use very simple, non-technical language for general audiences.
6. \"locations\": list up to {max_locations} key countries or regions where this snake lives.
7. Provide accurate translations of every text field in {languages}, keyed by {keys} in \"data\" and \"details\".
8. \"details\": thai_names lists common Thai names, other_names lists alternative English names, \
active_time is Diurnal, Nocturnal or Crepuscular, venom_toxicity names the venom type and clinical effects, \
danger_to_humans gives a detailed danger assessment.
9. If the photo is unclear or you need more information, set \"needs_clarification\" to true \
and put what would help in \"suggestions\". List look-alike species in \"related_species\".
10. If unsure about any aspect, be conservative and set \"found\" to false.

{shape}",
            threshold = CONFIDENCE_THRESHOLD,
            max_locations = MAX_LOCATIONS,
            languages = languages,
            keys = keys,
            shape = RESPONSE_SHAPE,
        )
    }

    /// Message content for an identification call
    pub fn identification_messages(&self, request: &IdentificationRequest) -> Vec<ChatMessage> {
        let mut content = vec![ContentPart::text(self.instruction())];

        if let Some(url) = request.image_data_url() {
            content.push(ContentPart::image_url(url));
            content.push(ContentPart::text(format!(
                "{} Only confirm identification if you are {}%+ confident.",
                IMAGE_PROMPT, CONFIDENCE_THRESHOLD
            )));
        }
        if let Some(query) = request.query() {
            content.push(ContentPart::text(format!(
                "Retrieve accurate, detailed field guide information about the snake species named \"{}\". \
Only provide information if the name clearly refers to a real, identifiable snake species.",
                query
            )));
        }

        vec![ChatMessage::user(content)]
    }

    /// Message content for the image pre-check; `None` for text requests
    pub fn precheck_messages(&self, request: &IdentificationRequest) -> Option<Vec<ChatMessage>> {
        let url = request.image_data_url()?;
        Some(vec![ChatMessage::user(vec![
            ContentPart::image_url(url),
            ContentPart::text(format!(
                "Analyze this image and respond with ONLY \"{present}\" if there is a clear, identifiable \
snake in the image, or \"{absent}\" if it is not a snake or too blurry. Be strict: the image must be \
clear enough to reliably identify the species. Respond with exactly one of these two words.",
                present = SNAKE_PRESENT,
                absent = NOT_A_SNAKE,
            )),
        ])])
    }

    /// Identification request addressed to `model`
    pub fn completion(&self, model: &ModelDescriptor, messages: &[ChatMessage]) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: model.id.clone(),
            messages: messages.to_vec(),
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        }
    }

    /// Pre-check request addressed to `model`
    pub fn precheck_completion(
        &self,
        model: &ModelDescriptor,
        messages: &[ChatMessage],
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            max_tokens: Some(PRECHECK_MAX_TOKENS),
            ..self.completion(model, messages)
        }
    }
}

fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "th" => "Thai",
        "zh" => "Chinese",
        "ja" => "Japanese",
        "vi" => "Vietnamese",
        "ms" => "Malay",
        "id" => "Indonesian",
        other => other,
    }
}

/// Whether a pre-check reply accepts the image
pub fn precheck_accepts(reply: &str) -> bool {
    reply.to_lowercase().contains(SNAKE_PRESENT)
}
