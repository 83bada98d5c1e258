//! Error handling for the species identification SDK
//!
//! Only two failures ever reach a caller of [`Orchestrator::identify`]:
//!
//! - [`IdentifyError::Configuration`] when the client cannot be set up
//!   (missing credential, empty model pool, unusable settings)
//! - [`IdentifyError::AllBackendsUnavailable`] when every model and every
//!   attempt has been spent without a usable answer
//!
//! Everything that goes wrong inside a single attempt is an
//! [`AttemptFailure`]. Those are absorbed by the orchestrator, logged, and
//! turned into a [`NextStep`] through a fixed table.
//!
//! [`Orchestrator::identify`]: crate::orchestrator::Orchestrator::identify

use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub mod mapping;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, IdentifyError>;

/// Errors surfaced by the SDK
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifyError {
    /// The client is misconfigured; raised before any network attempt
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No backend produced a usable answer. The cause is deliberately not
    /// distinguished (rate limit, outage and credential problems look alike).
    #[error("Species identification is currently unavailable, please try again later")]
    AllBackendsUnavailable,
}

impl IdentifyError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        IdentifyError::Configuration(message.into())
    }

    /// Whether this is a configuration error
    pub fn is_configuration(&self) -> bool {
        matches!(self, IdentifyError::Configuration(_))
    }

    /// Whether the caller may reasonably try again later
    pub fn is_retryable(&self) -> bool {
        matches!(self, IdentifyError::AllBackendsUnavailable)
    }
}

/// Why a single attempt did not produce a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// Rate limited, server error or transport error
    Transient(TransientCause),

    /// The model does not exist on the backend
    Permanent,

    /// A success response whose content could not be decoded
    Malformed(String),
}

/// The concrete cause of a transient failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientCause {
    /// HTTP 429
    RateLimited,
    /// Any other non-2xx status, or 0 for a malformed success body
    Server(u16),
    /// Connection refused, DNS, timeout and friends
    Transport(String),
}

/// What the orchestrator does after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Same model again, after an exponential backoff delay
    RetryAfterBackoff,

    /// Same model again, spaced only by the rate limiter
    RetryNow,

    /// Give up on this model for the current call
    NextModel {
        /// Rotate the pool cursor so future calls start elsewhere
        advance_cursor: bool,
        /// Extra pause before the next model is tried
        cooldown: Option<Duration>,
    },
}

impl AttemptFailure {
    /// Decide the next step. `attempt` is 1-based and counts attempts made
    /// against the current model; `max_attempts` is the per-model bound.
    pub fn next_step(&self, attempt: u32, max_attempts: u32, cooldown: Duration) -> NextStep {
        let attempts_remain = attempt < max_attempts;

        match self {
            AttemptFailure::Transient(TransientCause::RateLimited) => NextStep::NextModel {
                advance_cursor: true,
                cooldown: Some(cooldown),
            },
            AttemptFailure::Permanent => NextStep::NextModel {
                advance_cursor: true,
                cooldown: None,
            },
            AttemptFailure::Transient(_) if attempts_remain => NextStep::RetryAfterBackoff,
            AttemptFailure::Malformed(_) if attempts_remain => NextStep::RetryNow,
            _ => NextStep::NextModel {
                advance_cursor: false,
                cooldown: None,
            },
        }
    }

    /// Short label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            AttemptFailure::Transient(TransientCause::RateLimited) => "rate_limited",
            AttemptFailure::Transient(TransientCause::Server(_)) => "server_error",
            AttemptFailure::Transient(TransientCause::Transport(_)) => "transport_error",
            AttemptFailure::Permanent => "not_found",
            AttemptFailure::Malformed(_) => "malformed_response",
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Transient(TransientCause::RateLimited) => write!(f, "rate limited"),
            AttemptFailure::Transient(TransientCause::Server(0)) => {
                write!(f, "malformed success response")
            }
            AttemptFailure::Transient(TransientCause::Server(code)) => {
                write!(f, "server error (HTTP {})", code)
            }
            AttemptFailure::Transient(TransientCause::Transport(cause)) => {
                write!(f, "transport error: {}", cause)
            }
            AttemptFailure::Permanent => write!(f, "model not found"),
            AttemptFailure::Malformed(reason) => write!(f, "unparseable content: {}", reason),
        }
    }
}
