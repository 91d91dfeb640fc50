//! Listener settings for the webhook receiver

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;

use super::error::ValidationError;

/// Where the receiver listens and how it logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind, as an IP literal
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    /// `EnvFilter` directive applied when `RUST_LOG` is unset
    pub log_level: String,
}

/// Deployment stage. Production switches logs to JSON and requires https.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ServerConfig {
    /// Address handed to the TCP listener.
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let ip: IpAddr = self.host.parse().map_err(|_| ValidationError::InvalidHost)?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        self.socket_addr().map(|_| ())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_level: "info,billing_gateway=debug,tower_http=info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(host: &str, port: u16) -> ServerConfig {
        ServerConfig {
            host: host.to_string(),
            port,
            ..Default::default()
        }
    }

    #[test]
    fn binds_all_interfaces_by_default() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:8080");
        assert!(config.log_level.contains("billing_gateway=debug"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn accepts_ipv6_literal() {
        let addr = on("::1", 9000).socket_addr().unwrap();
        assert_eq!(addr.to_string(), "[::1]:9000");
    }

    #[test]
    fn hostname_is_not_an_ip_literal() {
        assert_eq!(on("localhost", 8080).validate(), Err(ValidationError::InvalidHost));
        assert_eq!(on("not a host", 8080).validate(), Err(ValidationError::InvalidHost));
    }

    #[test]
    fn port_zero_is_rejected() {
        assert_eq!(on("127.0.0.1", 0).validate(), Err(ValidationError::InvalidPort));
    }

    #[test]
    fn environment_parses_lowercase_names() {
        for env in [
            Environment::Development,
            Environment::Staging,
            Environment::Production,
        ] {
            let parsed: Environment =
                serde_json::from_value(serde_json::json!(env.as_str())).unwrap();
            assert_eq!(parsed, env);
            assert_eq!(env.to_string(), env.as_str());
        }
    }

    #[test]
    fn only_production_is_production() {
        let mut config = ServerConfig::default();
        assert!(!config.is_production());
        config.environment = Environment::Staging;
        assert!(!config.is_production());
        config.environment = Environment::Production;
        assert!(config.is_production());
    }
}
