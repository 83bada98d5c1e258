//! Configuration management for the identification client
//!
//! Configuration is read through a [`ConfigProvider`], usually the
//! environment. The API key is the only required value; everything else has
//! a default.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{IdentifyError, Result};
use crate::resilience::RetryConfig;

/// Environment prefix for all settings
pub const ENV_PREFIX: &str = "SPECIES_ID";

/// Default OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model pool, tried in this order on a fresh process
pub const DEFAULT_MODELS: &[&str] = &[
    "google/gemini-2.0-flash-exp:free",
    "qwen/qwen2.5-vl-72b-instruct:free",
    "meta-llama/llama-3.2-11b-vision-instruct:free",
    "mistralai/mistral-small-3.1-24b-instruct:free",
];

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an unsigned integer configuration value
    fn get_u64(&self, key: &str) -> Result<u64> {
        let value = self.get_string(key)?;
        value.trim().parse::<u64>().map_err(|e| {
            IdentifyError::configuration(format!("Invalid integer for key {}: {}", key, e))
        })
    }

    /// Get a float configuration value
    fn get_float(&self, key: &str) -> Result<f64> {
        let value = self.get_string(key)?;
        value.trim().parse::<f64>().map_err(|e| {
            IdentifyError::configuration(format!("Invalid float for key {}: {}", key, e))
        })
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(IdentifyError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    /// Get a comma separated list, dropping empty entries
    fn get_list(&self, key: &str) -> Result<Vec<String>> {
        let value = self.get_string(key)?;
        Ok(value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect())
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an unsigned integer configuration value with a default.
    /// A present but malformed value is an error, not the default.
    fn get_u64_or(&self, key: &str, default: u64) -> Result<u64> {
        match self.get_string(key) {
            Ok(_) => self.get_u64(key),
            Err(_) => Ok(default),
        }
    }

    /// Get a `u32` configuration value with a default. Values that do not
    /// fit are an error.
    fn get_u32_or(&self, key: &str, default: u32) -> Result<u32> {
        let value = self.get_u64_or(key, u64::from(default))?;
        u32::try_from(value).map_err(|_| {
            IdentifyError::configuration(format!("Value out of range for key {}: {}", key, value))
        })
    }

    /// Get a float configuration value with a default
    fn get_float_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.get_string(key) {
            Ok(_) => self.get_float(key),
            Err(_) => Ok(default),
        }
    }

    /// Get a boolean configuration value with a default
    fn get_bool_or(&self, key: &str, default: bool) -> Result<bool> {
        match self.get_string(key) {
            Ok(_) => self.get_bool(key),
            Err(_) => Ok(default),
        }
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                IdentifyError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => IdentifyError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| IdentifyError::configuration(format!("Configuration key not found: {}", key)))
    }
}

/// A composite config provider that tries multiple providers in order
#[derive(Clone, Default)]
pub struct CompositeConfigProvider {
    providers: Vec<Arc<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    /// Create a new composite config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider to the end of the chain
    pub fn add_provider(&mut self, provider: impl ConfigProvider + 'static) {
        self.providers.push(Arc::new(provider));
    }

    /// Builder form of [`add_provider`](Self::add_provider)
    pub fn with_provider(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.add_provider(provider);
        self
    }
}

impl ConfigProvider for CompositeConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        for provider in &self.providers {
            if let Ok(value) = provider.get_string(key) {
                return Ok(value);
            }
        }

        Err(IdentifyError::configuration(format!(
            "Configuration key not found in any provider: {}",
            key
        )))
    }
}

/// Global default configuration provider: `SPECIES_ID_*` variables first,
/// then unprefixed ones (so a bare `API_KEY` is honoured)
pub static DEFAULT_PROVIDER: Lazy<Arc<CompositeConfigProvider>> = Lazy::new(|| {
    Arc::new(
        CompositeConfigProvider::new()
            .with_provider(EnvConfigProvider::new().with_prefix(ENV_PREFIX))
            .with_provider(EnvConfigProvider::new()),
    )
});

/// Trait for service-specific configuration
pub trait ServiceConfig: Debug + Send + Sync {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;

    /// Service name
    fn service_name(&self) -> &str;
}

/// Settings for the identification orchestrator and its HTTP backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifierConfig {
    /// API key for the inference backend
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Ordered model pool
    pub models: Vec<String>,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Minimum spacing between any two outbound requests
    pub min_interval_ms: u64,

    /// Extra attempts per model after the first
    pub retries_per_model: u32,

    /// First backoff delay after a transient failure
    pub backoff_initial_ms: u64,

    /// Backoff ceiling
    pub backoff_max_ms: u64,

    /// Backoff growth factor
    pub backoff_multiplier: f64,

    /// Jitter applied to backoff delays (0.0 - 1.0)
    pub backoff_randomization: f64,

    /// Pause after a 429 before the next model is tried
    pub rate_limit_cooldown_ms: u64,

    /// Completion token bound
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Language codes every result must carry
    pub languages: Vec<String>,

    /// Ask the backend whether an image shows a snake before identifying it
    pub image_precheck: bool,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            timeout_seconds: 60,
            min_interval_ms: 2000,
            retries_per_model: 2,
            backoff_initial_ms: 1000,
            backoff_max_ms: 8000,
            backoff_multiplier: 2.0,
            backoff_randomization: 0.2,
            rate_limit_cooldown_ms: 1000,
            max_tokens: 4096,
            temperature: 0.1,
            languages: vec!["en".to_string(), "th".to_string()],
            image_precheck: false,
        }
    }
}

impl IdentifierConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();

        let api_key = provider.get_string("api_key").map_err(|_| {
            IdentifyError::configuration(format!(
                "API key is required (set {}_API_KEY or API_KEY)",
                ENV_PREFIX
            ))
        })?;

        let models = match provider.get_list("models") {
            Ok(models) => models,
            Err(_) => defaults.models,
        };

        let languages = match provider.get_list("languages") {
            Ok(languages) => languages,
            Err(_) => defaults.languages,
        };

        let config = Self {
            api_key,
            base_url: provider.get_string_or("base_url", &defaults.base_url),
            models,
            timeout_seconds: provider.get_u64_or("timeout_seconds", defaults.timeout_seconds)?,
            min_interval_ms: provider.get_u64_or("min_interval_ms", defaults.min_interval_ms)?,
            retries_per_model: provider
                .get_u32_or("retries_per_model", defaults.retries_per_model)?,
            backoff_initial_ms: provider
                .get_u64_or("backoff_initial_ms", defaults.backoff_initial_ms)?,
            backoff_max_ms: provider.get_u64_or("backoff_max_ms", defaults.backoff_max_ms)?,
            backoff_multiplier: provider
                .get_float_or("backoff_multiplier", defaults.backoff_multiplier)?,
            backoff_randomization: provider
                .get_float_or("backoff_randomization", defaults.backoff_randomization)?,
            rate_limit_cooldown_ms: provider
                .get_u64_or("rate_limit_cooldown_ms", defaults.rate_limit_cooldown_ms)?,
            max_tokens: provider.get_u32_or("max_tokens", defaults.max_tokens)?,
            temperature: provider.get_float_or("temperature", f64::from(defaults.temperature))?
                as f32,
            languages,
            image_precheck: provider.get_bool_or("image_precheck", defaults.image_precheck)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_provider(&**DEFAULT_PROVIDER)
    }

    /// Retry settings derived from this configuration
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.retries_per_model,
            initial_interval: Duration::from_millis(self.backoff_initial_ms),
            max_interval: Duration::from_millis(self.backoff_max_ms),
            multiplier: self.backoff_multiplier,
            randomization_factor: self.backoff_randomization,
        }
    }

    /// Minimum spacing between outbound requests
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Pause applied after a rate-limited attempt
    pub fn rate_limit_cooldown(&self) -> Duration {
        Duration::from_millis(self.rate_limit_cooldown_ms)
    }
}

impl ServiceConfig for IdentifierConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(IdentifyError::configuration("API key is required"));
        }

        if self.base_url.is_empty() {
            return Err(IdentifyError::configuration("Base URL is required"));
        }

        if self.timeout_seconds == 0 {
            return Err(IdentifyError::configuration("Timeout must be at least one second"));
        }

        if self.models.iter().all(|m| m.trim().is_empty()) {
            return Err(IdentifyError::configuration("At least one model is required"));
        }

        if self.languages.is_empty() {
            return Err(IdentifyError::configuration("At least one language is required"));
        }

        if !(0.0..=1.0).contains(&self.backoff_randomization) {
            return Err(IdentifyError::configuration(
                "Backoff randomization must be between 0.0 and 1.0",
            ));
        }

        if self.backoff_multiplier < 1.0 {
            return Err(IdentifyError::configuration("Backoff multiplier must be at least 1.0"));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "species-id"
    }
}
