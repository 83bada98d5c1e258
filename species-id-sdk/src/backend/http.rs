//! HTTP backend for OpenAI-compatible chat completion APIs

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{header, Client};

use super::{AttemptOutcome, BackendInvoker, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::{IdentifierConfig, ServiceConfig};
use crate::error::mapping::{classify_status, classify_transport, status_label};
use crate::error::{IdentifyError, Result};
use crate::pool::ModelDescriptor;
use crate::util::{sanitize_for_logging, truncate_string};

/// Max characters of an upstream body kept in log lines
const LOG_BODY_LIMIT: usize = 300;

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "species-id-sdk".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)
    }
}

/// Chat completion backend over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl HttpBackend {
    /// Create a backend from validated configuration
    pub fn new(config: &IdentifierConfig) -> Result<Self> {
        config.validate()?;

        let http_client = build_http_client(
            UserAgent::default(),
            Duration::from_secs(config.timeout_seconds),
        )?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Build a standard HTTP client with default settings
fn build_http_client(user_agent: UserAgent, timeout: Duration) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&user_agent.to_string())
            .map_err(|e| IdentifyError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| IdentifyError::configuration(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait]
impl BackendInvoker for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    async fn invoke(
        &self,
        model: &ModelDescriptor,
        request: &ChatCompletionRequest,
    ) -> AttemptOutcome {
        let url = self.completions_url();
        debug!("Sending request to {}: POST {}", model, url);

        let start_time = Instant::now();
        let response = match self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return classify_transport(&err),
        };

        let status = response.status();
        debug!(
            "{} answered {} ({}) in {:?}",
            model,
            status.as_u16(),
            status_label(status),
            start_time.elapsed()
        );

        if !status.is_success() {
            // the status decides the outcome; the body is only for the log
            let body = response.text().await.unwrap_or_default();
            warn!(
                "{} returned HTTP {}: {}",
                model,
                status.as_u16(),
                sanitize_for_logging(&truncate_string(&body, LOG_BODY_LIMIT))
            );
            return classify_status(status);
        }

        // reading the body can still fail at the transport level
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return classify_transport(&err),
        };

        match serde_json::from_str::<ChatCompletionResponse>(&body) {
            Ok(parsed) => {
                if let Some(usage) = &parsed.usage {
                    debug!("{} used {} tokens", model, usage.total_tokens);
                }
                match parsed.first_text() {
                    Some(text) => AttemptOutcome::Success(text),
                    None => {
                        warn!("{} returned a success without message content", model);
                        AttemptOutcome::ServerError(0)
                    }
                }
            }
            Err(e) => {
                warn!("{} returned an undecodable success body: {}", model, e);
                AttemptOutcome::ServerError(0)
            }
        }
    }
}
