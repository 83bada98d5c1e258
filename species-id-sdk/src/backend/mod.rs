//! Backend invocation
//!
//! A [`BackendInvoker`] performs exactly one network exchange with one model
//! and classifies what happened. It never retries; retry policy belongs to
//! the orchestrator.

mod http;
mod models;

pub use http::HttpBackend;
pub use models::*;

use async_trait::async_trait;

use crate::error::{AttemptFailure, TransientCause};
use crate::pool::ModelDescriptor;

/// Classified result of one attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx with the first message's text content
    Success(String),
    /// HTTP 429
    RateLimited,
    /// HTTP 404
    NotFound,
    /// Any other non-2xx status; 0 marks a malformed success body
    ServerError(u16),
    /// The exchange never produced a status
    TransportError(String),
}

impl AttemptOutcome {
    /// The success text, or the failure it classifies as
    pub fn into_text(self) -> Result<String, AttemptFailure> {
        match self {
            AttemptOutcome::Success(text) => Ok(text),
            AttemptOutcome::RateLimited => Err(AttemptFailure::Transient(TransientCause::RateLimited)),
            AttemptOutcome::NotFound => Err(AttemptFailure::Permanent),
            AttemptOutcome::ServerError(code) => {
                Err(AttemptFailure::Transient(TransientCause::Server(code)))
            }
            AttemptOutcome::TransportError(cause) => {
                Err(AttemptFailure::Transient(TransientCause::Transport(cause)))
            }
        }
    }
}

/// One request/response exchange against one model
#[async_trait]
pub trait BackendInvoker: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Send `request` to `model` and classify the outcome
    async fn invoke(&self, model: &ModelDescriptor, request: &ChatCompletionRequest)
        -> AttemptOutcome;
}
