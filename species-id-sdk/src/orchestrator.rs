//! Identification orchestrator
//!
//! The only component callers talk to. One call walks the model pool in
//! rotation order and makes up to `retries_per_model + 1` attempts against
//! each model, one outstanding request at a time, every attempt spaced by
//! the shared [`RateLimiter`]. What happens after a failed attempt is decided
//! by [`AttemptFailure::next_step`].
//!
//! Per-attempt failures are logged and absorbed. A caller only ever sees a
//! validated [`IdentificationResult`], a configuration error, or
//! [`IdentifyError::AllBackendsUnavailable`].

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde_json::Value;

use crate::backend::{BackendInvoker, ChatCompletionRequest, HttpBackend};
use crate::config::{IdentifierConfig, ServiceConfig};
use crate::error::{AttemptFailure, IdentifyError, NextStep, Result};
use crate::extract::extract;
use crate::pool::{ModelDescriptor, ModelPool};
use crate::prompt::{precheck_accepts, PromptBuilder};
use crate::request::{IdentificationRequest, InputKind};
use crate::resilience::{RateLimiter, RetryConfig};
use crate::schema::IdentificationResult;
use crate::util::{generate_request_id, truncate_string};
use crate::validate::ResultValidator;

/// Characters of unparseable model output kept in a log line
const LOG_CONTENT_LIMIT: usize = 200;

/// Resilient multi-model identification client
pub struct Orchestrator {
    invoker: Arc<dyn BackendInvoker>,
    pool: ModelPool,
    rate_limiter: RateLimiter,
    prompts: PromptBuilder,
    validator: ResultValidator,
    retry: RetryConfig,
    min_interval: Duration,
    rate_limit_cooldown: Duration,
    image_precheck: bool,
}

impl Orchestrator {
    /// Orchestrator over the HTTP backend. Fails with a configuration error,
    /// before any network traffic, when the settings are unusable.
    pub fn from_config(config: &IdentifierConfig) -> Result<Self> {
        let backend = HttpBackend::new(config)?;
        Self::with_invoker(config, Arc::new(backend))
    }

    /// Orchestrator configured from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_config(&IdentifierConfig::from_env()?)
    }

    /// Orchestrator over a caller-supplied backend
    pub fn with_invoker(config: &IdentifierConfig, invoker: Arc<dyn BackendInvoker>) -> Result<Self> {
        config.validate()?;

        let pool = ModelPool::new(config.models.iter().cloned())?;
        info!(
            "Identification orchestrator ready: backend={}, models={}, {}",
            invoker.name(),
            pool.len(),
            config.retry_config()
        );

        Ok(Self {
            invoker,
            pool,
            rate_limiter: RateLimiter::new(),
            prompts: PromptBuilder::from_config(config),
            validator: ResultValidator::new(config.languages.iter().cloned()),
            retry: config.retry_config(),
            min_interval: config.min_interval(),
            rate_limit_cooldown: config.rate_limit_cooldown(),
            image_precheck: config.image_precheck,
        })
    }

    /// Enable or disable the image pre-check
    pub fn with_image_precheck(mut self, enabled: bool) -> Self {
        self.image_precheck = enabled;
        self
    }

    /// The model pool and its rotation cursor
    pub fn pool(&self) -> &ModelPool {
        &self.pool
    }

    /// Identify the species in a photo
    pub async fn identify_image(&self, bytes: impl AsRef<[u8]>) -> Result<IdentificationResult> {
        self.identify(&IdentificationRequest::image(bytes)).await
    }

    /// Look up a species by name or description
    pub async fn identify_text(&self, query: impl Into<String>) -> Result<IdentificationResult> {
        self.identify(&IdentificationRequest::text(query)).await
    }

    /// Run one identification
    pub async fn identify(&self, request: &IdentificationRequest) -> Result<IdentificationResult> {
        let request_id = generate_request_id();
        info!("[{}] Identifying {} input", request_id, request.kind());

        if self.image_precheck && request.kind() == InputKind::Image {
            if let Some(messages) = self.prompts.precheck_messages(request) {
                let accepted = self
                    .run(
                        &request_id,
                        "precheck",
                        |model| self.prompts.precheck_completion(model, &messages),
                        |raw| {
                            if raw.trim().is_empty() {
                                Err("empty reply".to_string())
                            } else {
                                Ok(precheck_accepts(raw))
                            }
                        },
                    )
                    .await?;

                if !accepted {
                    info!("[{}] Image rejected by pre-check", request_id);
                    return Ok(IdentificationResult::rejected_image(self.validator.languages()));
                }
            }
        }

        let messages = self.prompts.identification_messages(request);
        let result = self
            .run(
                &request_id,
                "identify",
                |model| self.prompts.completion(model, &messages),
                |raw| self.decode(raw),
            )
            .await?;

        info!(
            "[{}] Identification finished: found={}, confidence={}",
            request_id, result.found, result.confidence
        );
        Ok(result)
    }

    /// Extract, parse and validate one model reply
    fn decode(&self, raw: &str) -> std::result::Result<IdentificationResult, String> {
        let candidate = extract(raw);
        let value: Value = serde_json::from_str(&candidate).map_err(|e| {
            format!("{} in {:?}", e, truncate_string(&candidate, LOG_CONTENT_LIMIT))
        })?;

        if !value.is_object() {
            return Err("top-level JSON value is not an object".to_string());
        }

        Ok(self.validator.validate(&value))
    }

    /// Drive the model x attempt matrix until `decode` accepts a reply
    async fn run<T, B, D>(&self, request_id: &str, purpose: &str, build: B, decode: D) -> Result<T>
    where
        B: Fn(&ModelDescriptor) -> ChatCompletionRequest,
        D: Fn(&str) -> std::result::Result<T, String>,
    {
        let max_attempts = self.retry.max_attempts();
        // snapshot so cursor moves during this call do not skip models
        let rotation = self.pool.rotation();
        let last = rotation.len().saturating_sub(1);

        for (position, model) in rotation.iter().enumerate() {
            let body = build(model);
            let mut backoff = self.retry.backoff();
            let mut attempt = 0;

            loop {
                attempt += 1;
                self.rate_limiter.wait(self.min_interval).await;

                debug!(
                    "[{}] {} attempt {}/{} on {}",
                    request_id, purpose, attempt, max_attempts, model
                );
                let outcome = self.invoker.invoke(model, &body).await;

                let failure = match outcome.into_text() {
                    Ok(raw) => match decode(&raw) {
                        Ok(value) => {
                            debug!("[{}] {} succeeded on {}", request_id, purpose, model);
                            return Ok(value);
                        }
                        Err(reason) => AttemptFailure::Malformed(reason),
                    },
                    Err(failure) => failure,
                };

                warn!(
                    "[{}] {} attempt {}/{} on {} failed ({}): {}",
                    request_id,
                    purpose,
                    attempt,
                    max_attempts,
                    model,
                    failure.label(),
                    failure
                );

                match failure.next_step(attempt, max_attempts, self.rate_limit_cooldown) {
                    NextStep::RetryAfterBackoff => {
                        let delay = backoff.next_delay();
                        debug!("[{}] Backing off {:?} before retrying {}", request_id, delay, model);
                        tokio::time::sleep(delay).await;
                    }
                    NextStep::RetryNow => {}
                    NextStep::NextModel {
                        advance_cursor,
                        cooldown,
                    } => {
                        if advance_cursor {
                            self.pool.advance_past(model);
                        }
                        if let Some(cooldown) = cooldown.filter(|_| position < last) {
                            tokio::time::sleep(cooldown).await;
                        }
                        break;
                    }
                }
            }
        }

        warn!(
            "[{}] {} exhausted {} models without a usable reply",
            request_id,
            purpose,
            rotation.len()
        );
        Err(IdentifyError::AllBackendsUnavailable)
    }
}
