//! Tests for configuration management functionality
//!
//! These tests verify provider lookups and how `IdentifierConfig` is loaded
//! and validated.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env;
    use std::time::Duration;

    use tokio_test::{assert_err, assert_ok};

    use crate::config::{
        CompositeConfigProvider, ConfigProvider, ConfigProviderExt, EnvConfigProvider,
        IdentifierConfig, MemoryConfigProvider, ServiceConfig, DEFAULT_MODELS,
    };

    fn provider_with_key() -> MemoryConfigProvider {
        let mut provider = MemoryConfigProvider::new();
        provider.set("api_key", "sk-test");
        provider
    }

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("api_key", "test_key");
        provider.set("timeout_seconds", 30);
        provider.set("image_precheck", "yes");
        provider.set("models", "a, b,,c ");

        assert_eq!(provider.get_string("api_key").unwrap(), "test_key");
        assert_eq!(provider.get_u64("timeout_seconds").unwrap(), 30);
        assert!(provider.get_bool("image_precheck").unwrap());
        assert_eq!(provider.get_list("models").unwrap(), vec!["a", "b", "c"]);

        // Defaults only apply to missing keys
        assert_eq!(provider.get_string_or("missing", "default"), "default");
        assert_eq!(provider.get_u64_or("missing", 60).unwrap(), 60);
        assert!(provider.get_u64_or("api_key", 60).is_err());
        assert!(provider.get_bool("api_key").is_err());
    }

    #[test]
    fn test_env_config_provider() {
        env::set_var("SPECIES_ID_CFGTEST_API_KEY", "env_test_key");
        env::set_var("SPECIES_ID_CFGTEST_MIN_INTERVAL_MS", "750");

        let provider = EnvConfigProvider::new().with_prefix("SPECIES_ID_CFGTEST");

        assert_eq!(provider.get_string("api_key").unwrap(), "env_test_key");
        assert_eq!(provider.get_u64("min_interval_ms").unwrap(), 750);
        assert!(provider.get_string("missing").is_err());

        let config = IdentifierConfig::from_provider(&provider).unwrap();
        assert_eq!(config.api_key, "env_test_key");
        assert_eq!(config.min_interval(), Duration::from_millis(750));

        env::remove_var("SPECIES_ID_CFGTEST_API_KEY");
        env::remove_var("SPECIES_ID_CFGTEST_MIN_INTERVAL_MS");
    }

    #[test]
    fn test_defaults() {
        let config = IdentifierConfig::from_provider(&provider_with_key()).unwrap();

        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.models.len(), DEFAULT_MODELS.len());
        assert_eq!(config.timeout_seconds, 60);
        assert_eq!(config.min_interval(), Duration::from_millis(2000));
        assert_eq!(config.rate_limit_cooldown(), Duration::from_millis(1000));
        assert_eq!(config.languages, vec!["en", "th"]);
        assert!(!config.image_precheck);

        let retry = config.retry_config();
        assert_eq!(retry.max_attempts(), 3);
        assert_eq!(retry.initial_interval, Duration::from_millis(1000));
        assert_eq!(retry.max_interval, Duration::from_millis(8000));
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = assert_err!(IdentifierConfig::from_provider(&MemoryConfigProvider::new()));
        assert!(err.is_configuration());
        assert!(err.to_string().contains("API_KEY"));

        let mut provider = MemoryConfigProvider::new();
        provider.set("api_key", "   ");
        assert!(IdentifierConfig::from_provider(&provider).unwrap_err().is_configuration());
    }

    #[test]
    fn test_overrides_and_validation() {
        let mut values = HashMap::new();
        values.insert("api_key".to_string(), "sk-test".to_string());
        values.insert("models".to_string(), "m1,m2".to_string());
        values.insert("retries_per_model".to_string(), "0".to_string());
        values.insert("languages".to_string(), "en".to_string());
        let config = IdentifierConfig::from_provider(&MemoryConfigProvider::with_values(values)).unwrap();

        assert_eq!(config.models, vec!["m1", "m2"]);
        assert_eq!(config.retry_config().max_attempts(), 1);
        assert_eq!(config.languages, vec!["en"]);

        let mut provider = provider_with_key();
        provider.set("backoff_randomization", "1.5");
        assert!(IdentifierConfig::from_provider(&provider).unwrap_err().is_configuration());

        let mut provider = provider_with_key();
        provider.set("models", " , ");
        assert!(IdentifierConfig::from_provider(&provider).is_err());

        let mut provider = provider_with_key();
        provider.set("timeout_seconds", "soon");
        assert!(IdentifierConfig::from_provider(&provider).is_err());
    }

    #[test]
    fn test_out_of_range_integers_are_rejected() {
        let mut provider = provider_with_key();
        provider.set("retries_per_model", "4294967296");
        let err = assert_err!(IdentifierConfig::from_provider(&provider));
        assert!(err.is_configuration());
        assert!(err.to_string().contains("retries_per_model"));

        let mut provider = provider_with_key();
        provider.set("max_tokens", u64::from(u32::MAX) + 1);
        assert!(IdentifierConfig::from_provider(&provider).unwrap_err().is_configuration());

        let mut provider = provider_with_key();
        provider.set("retries_per_model", u32::MAX);
        assert_eq!(assert_ok!(IdentifierConfig::from_provider(&provider)).retries_per_model, u32::MAX);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut provider = provider_with_key();
        provider.set("timeout_seconds", 0);
        assert!(IdentifierConfig::from_provider(&provider).unwrap_err().is_configuration());

        let config = IdentifierConfig {
            api_key: "sk-test".to_string(),
            timeout_seconds: 0,
            ..IdentifierConfig::default()
        };
        assert_err!(config.validate());
    }

    #[test]
    fn test_prefixed_key_wins_over_bare_key() {
        let mut prefixed = MemoryConfigProvider::new();
        prefixed.set("api_key", "prefixed");
        let mut bare = MemoryConfigProvider::new();
        bare.set("api_key", "bare");
        bare.set("base_url", "http://localhost:8080/v1");

        let provider = CompositeConfigProvider::new()
            .with_provider(prefixed)
            .with_provider(bare);
        let config = IdentifierConfig::from_provider(&provider).unwrap();

        assert_eq!(config.api_key, "prefixed");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.service_name(), "species-id");
    }

    #[test]
    fn test_default_config_requires_key() {
        let config = IdentifierConfig::default();
        assert!(config.validate().is_err());

        let config = IdentifierConfig {
            api_key: "sk-test".to_string(),
            ..IdentifierConfig::default()
        };
        assert_ok!(config.validate());
    }
}
