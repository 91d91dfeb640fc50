//! Provider API configuration

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;
use crate::adapters::http_client::TransportConfig;

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Credentials and endpoint for the payment provider API
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider API
    #[serde(default)]
    pub base_url: String,

    /// Account public key
    #[serde(default)]
    pub public_key: String,

    /// Account secret key
    #[serde(default)]
    pub secret_key: String,

    /// Timeout for each outbound request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the transport configuration for [`crate::adapters::TransportClient`].
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::new(self.public_key.clone(), self.secret_key.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(self.request_timeout())
    }

    /// Validate provider configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("PROVIDER__BASE_URL"));
        }
        if self.public_key.is_empty() {
            return Err(ValidationError::MissingRequired("PROVIDER__PUBLIC_KEY"));
        }
        if self.secret_key.is_empty() {
            return Err(ValidationError::MissingRequired("PROVIDER__SECRET_KEY"));
        }

        let is_https = self.base_url.starts_with("https://");
        if !is_https && !self.base_url.starts_with("http://") {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if *environment == Environment::Production && !is_https {
            return Err(ValidationError::BaseUrlMustBeHttps);
        }

        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ValidationError::InvalidTimeout);
        }

        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            public_key: String::new(),
            secret_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("public_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_request_timeout() -> u64 {
    30
}
