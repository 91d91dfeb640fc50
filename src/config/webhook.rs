//! Webhook configuration

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::webhook::{decode_signing_secret, WebhookError, WebhookVerifier};

const MAX_TOLERANCE_SECS: u64 = 3600;

/// Webhook signing configuration
#[derive(Clone, Deserialize)]
pub struct WebhookConfig {
    /// Signing secret, optionally prefixed with `whsec_`
    #[serde(default)]
    pub signing_secret: String,

    /// Accepted clock drift for the timestamp header, in seconds
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: u64,
}

impl WebhookConfig {
    /// Build a verifier from this configuration.
    pub fn verifier(&self) -> Result<WebhookVerifier, WebhookError> {
        Ok(WebhookVerifier::new(&self.signing_secret)?
            .with_tolerance(Duration::from_secs(self.tolerance_secs)))
    }

    /// Validate webhook configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.signing_secret.is_empty() {
            return Err(ValidationError::MissingRequired("WEBHOOK__SIGNING_SECRET"));
        }
        decode_signing_secret(&self.signing_secret)
            .map_err(|_| ValidationError::InvalidWebhookSecret)?;

        if self.tolerance_secs == 0 || self.tolerance_secs > MAX_TOLERANCE_SECS {
            return Err(ValidationError::InvalidTolerance);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            tolerance_secs: default_tolerance(),
        }
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("signing_secret", &"[REDACTED]")
            .field("tolerance_secs", &self.tolerance_secs)
            .finish()
    }
}

fn default_tolerance() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tolerance() {
        assert_eq!(WebhookConfig::default().tolerance_secs, 300);
    }

    #[test]
    fn test_validation_missing_secret() {
        assert_eq!(
            WebhookConfig::default().validate(),
            Err(ValidationError::MissingRequired("WEBHOOK__SIGNING_SECRET"))
        );
    }

    #[test]
    fn test_validation_invalid_secret() {
        let config = WebhookConfig {
            signing_secret: "whsec_not base64!".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidWebhookSecret));
    }

    #[test]
    fn test_validation_invalid_tolerance() {
        let config = WebhookConfig {
            signing_secret: "whsec_dGVzdA==".to_string(),
            tolerance_secs: 0,
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTolerance));
    }

    #[test]
    fn test_verifier_uses_tolerance() {
        let config = WebhookConfig {
            signing_secret: "whsec_dGVzdA==".to_string(),
            tolerance_secs: 60,
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.verifier().unwrap().tolerance(), Duration::from_secs(60));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = WebhookConfig {
            signing_secret: "whsec_dGVzdA==".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("dGVzdA"));
    }
}
