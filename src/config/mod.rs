//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BILLING_GATEWAY` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use billing_gateway::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod error;
mod provider;
mod server;
mod webhook;

pub use error::{ConfigError, ValidationError};
pub use provider::ProviderConfig;
pub use server::{Environment, ServerConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Provider API endpoint, credentials and request timeout
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Webhook signing secret and tolerance
    #[serde(default)]
    pub webhook: WebhookConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BILLING_GATEWAY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BILLING_GATEWAY__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BILLING_GATEWAY__PROVIDER__SECRET_KEY=...` -> `provider.secret_key = ...`
    /// - `BILLING_GATEWAY__PROVIDER__REQUEST_TIMEOUT_SECS=10` -> `provider.request_timeout_secs = 10`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    /// Missing required values are reported by [`AppConfig::validate()`].
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BILLING_GATEWAY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first missing or invalid value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.provider.validate(&self.server.environment)?;
        self.webhook.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 8] = [
        "BILLING_GATEWAY__PROVIDER__BASE_URL",
        "BILLING_GATEWAY__PROVIDER__PUBLIC_KEY",
        "BILLING_GATEWAY__PROVIDER__SECRET_KEY",
        "BILLING_GATEWAY__PROVIDER__REQUEST_TIMEOUT_SECS",
        "BILLING_GATEWAY__WEBHOOK__SIGNING_SECRET",
        "BILLING_GATEWAY__WEBHOOK__TOLERANCE_SECS",
        "BILLING_GATEWAY__SERVER__PORT",
        "BILLING_GATEWAY__SERVER__ENVIRONMENT",
    ];

    fn set_minimal_env() {
        env::set_var("BILLING_GATEWAY__PROVIDER__BASE_URL", "https://api.provider.test/v1");
        env::set_var("BILLING_GATEWAY__PROVIDER__PUBLIC_KEY", "pk_test_xxx");
        env::set_var("BILLING_GATEWAY__PROVIDER__SECRET_KEY", "sk_test_xxx");
        env::set_var("BILLING_GATEWAY__WEBHOOK__SIGNING_SECRET", "whsec_dGVzdA==");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.provider.base_url, "https://api.provider.test/v1");
        assert_eq!(config.provider.public_key, "pk_test_xxx");
        assert_eq!(config.webhook.tolerance_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_provider_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("BILLING_GATEWAY__WEBHOOK__SIGNING_SECRET", "whsec_dGVzdA==");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PROVIDER__BASE_URL"))
        );
    }

    #[test]
    fn test_server_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("BILLING_GATEWAY__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_custom_port_and_tolerance() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("BILLING_GATEWAY__SERVER__PORT", "3000");
        env::set_var("BILLING_GATEWAY__WEBHOOK__TOLERANCE_SECS", "120");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.webhook.tolerance_secs, 120);
    }

    #[test]
    fn test_request_timeout_reaches_transport() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("BILLING_GATEWAY__PROVIDER__REQUEST_TIMEOUT_SECS", "7");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.provider.transport_config().timeout,
            std::time::Duration::from_secs(7)
        );
    }

    #[test]
    fn test_out_of_range_timeout_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("BILLING_GATEWAY__PROVIDER__REQUEST_TIMEOUT_SECS", "0");
        let result = AppConfig::load();
        clear_env();

        assert_eq!(
            result.unwrap().validate(),
            Err(ValidationError::InvalidTimeout)
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let debug = format!("{:?}", result.unwrap());
        assert!(!debug.contains("sk_test_xxx"));
        assert!(!debug.contains("dGVzdA"));
    }
}
