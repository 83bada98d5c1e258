//! Identification requests

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Marker that ends the header of a data URL
const DATA_URL_MARKER: &str = "base64,";

/// What kind of input a request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A photo
    Image,
    /// A species name or description
    Text,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::Image => write!(f, "image"),
            InputKind::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Payload {
    /// Base64 encoded JPEG, without a data URL header
    Image(String),
    Text(String),
}

/// One identification call's input. Built once per call and only borrowed
/// by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationRequest {
    payload: Payload,
}

impl IdentificationRequest {
    /// Request for raw image bytes
    pub fn image(bytes: impl AsRef<[u8]>) -> Self {
        Self {
            payload: Payload::Image(STANDARD.encode(bytes)),
        }
    }

    /// Request for an image that is already base64 encoded. A full data URL
    /// is accepted; everything up to and including `base64,` is dropped.
    pub fn image_base64(encoded: &str) -> Self {
        let data = match encoded.find(DATA_URL_MARKER) {
            Some(index) => &encoded[index + DATA_URL_MARKER.len()..],
            None => encoded,
        };
        Self {
            payload: Payload::Image(data.trim().to_string()),
        }
    }

    /// Request for a free-text query such as a common name
    pub fn text(query: impl Into<String>) -> Self {
        Self {
            payload: Payload::Text(query.into()),
        }
    }

    /// Input kind
    pub fn kind(&self) -> InputKind {
        match self.payload {
            Payload::Image(_) => InputKind::Image,
            Payload::Text(_) => InputKind::Text,
        }
    }

    /// `data:image/jpeg;base64,...` URL for image requests
    pub fn image_data_url(&self) -> Option<String> {
        match &self.payload {
            Payload::Image(data) => Some(format!("data:image/jpeg;{}{}", DATA_URL_MARKER, data)),
            Payload::Text(_) => None,
        }
    }

    /// Query text for text requests
    pub fn query(&self) -> Option<&str> {
        match &self.payload {
            Payload::Text(query) => Some(query),
            Payload::Image(_) => None,
        }
    }
}
