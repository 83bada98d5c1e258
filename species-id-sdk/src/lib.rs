//! # Species ID SDK
//!
//! A resilient client for snake species identification over a pool of
//! OpenAI-compatible vision/text models.
//!
//! This crate provides:
//!
//! - The identification orchestrator: model rotation, per-model retries,
//!   a shared rate limiter and a single failure mode for callers
//! - An HTTP backend that classifies each exchange
//! - Tolerant extraction and validation of the model's JSON reply
//! - Configuration management utilities
//!
//! ## Architecture
//!
//! - `Orchestrator`: the only entry point; drives the model x attempt matrix
//! - `BackendInvoker`: one request against one model, classified as an
//!   `AttemptOutcome`
//! - `ModelPool`: ordered models plus a rotation cursor
//! - `RateLimiter`: minimum spacing between outbound requests
//! - `extract`: pulls the JSON object out of noisy model text
//! - `ResultValidator`: confidence gate and shape completeness
//! - `IdentifyError`: configuration errors and `AllBackendsUnavailable`

pub mod backend;
pub use backend::{AttemptOutcome, BackendInvoker, HttpBackend};

pub mod config;
pub use config::{ConfigProvider, IdentifierConfig, ServiceConfig};

pub mod error;
pub use error::{IdentifyError, Result};

pub mod extract;
pub use extract::extract;

pub mod orchestrator;
pub use orchestrator::Orchestrator;

pub mod pool;
pub use pool::{ModelDescriptor, ModelPool};

pub mod prompt;

pub mod request;
pub use request::{IdentificationRequest, InputKind};

pub mod resilience;
pub use resilience::{RateLimiter, RetryConfig};

pub mod schema;
pub use schema::{DangerLevel, IdentificationResult, LocalizedFields, Location, SpeciesDetail};

pub mod validate;
pub use validate::ResultValidator;

// Utility module for common functionality
mod util;

#[cfg(test)]
mod tests;
