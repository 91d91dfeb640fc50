//! HTTP transport for the provider API.
//!
//! Sends JSON requests with the account's credential headers and normalizes
//! every failure into an [`ApiError`]. The transport knows nothing about key
//! casing: bodies go out exactly as given and come back exactly as received,
//! except for error bodies, which are read to populate the error.
//!
//! # Configuration
//!
//! ```ignore
//! let config = TransportConfig::new(public_key, secret_key)
//!     .with_base_url("https://api.provider.test/v1")
//!     .with_timeout(Duration::from_secs(10));
//!
//! let client = TransportClient::new(config)?;
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::{Client, Method};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::domain::casing::to_camel_case_keys;
use crate::ports::ApiError;

/// Header carrying the account's public key.
pub const PUBLIC_KEY_HEADER: &str = "x-public-key";

/// Header carrying the account's secret key.
pub const SECRET_KEY_HEADER: &str = "x-secret-key";

/// Configuration for the provider transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    public_key: SecretString,
    secret_key: SecretString,
    /// Base URL every request path is joined onto.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl TransportConfig {
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: SecretString::new(public_key.into()),
            secret_key: SecretString::new(secret_key.into()),
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON-over-HTTP client for the provider API.
#[derive(Debug, Clone)]
pub struct TransportClient {
    config: TransportConfig,
    client: Client,
}

impl TransportClient {
    /// Creates a transport with the given configuration.
    ///
    /// # Errors
    ///
    /// `NetworkError` if the underlying HTTP client cannot be built.
    pub fn new(config: TransportConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Sends one request and returns the decoded JSON body.
    ///
    /// A successful response with an empty body yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// - `NetworkError` - No response (connection failure, timeout)
    /// - Status-derived codes - Non-2xx response; see [`crate::ports::ApiErrorCode::from_http_status`]
    /// - `DecodeError` - 2xx response whose body is not JSON
    pub async fn send_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        query: Option<&[(String, String)]>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(PUBLIC_KEY_HEADER, self.config.public_key.expose_secret())
            .header(SECRET_KEY_HEADER, self.config.secret_key.expose_secret())
            .header(ACCEPT, "application/json");

        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, url = %url, error = %e, "Provider request failed");
            if e.is_timeout() {
                ApiError::network(format!(
                    "Request timed out after {} seconds",
                    self.config.timeout.as_secs()
                ))
            } else {
                ApiError::network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("Failed to read provider response: {}", e)))?;

        if !status.is_success() {
            let error = error_from_response(status.as_u16(), &text);
            tracing::warn!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                code = %error.code,
                "Provider returned an error"
            );
            return Err(error);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| ApiError::decode(format!("Failed to parse provider response: {}", e)))
    }
}

/// Builds the normalized error for a non-success response.
///
/// Understands the provider's `{"message": ..., "errors": {field: [...]}}`
/// body; anything else falls back to the status reason phrase.
fn error_from_response(status: u16, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<Value>(body)
        .ok()
        .map(to_camel_case_keys);

    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| reason_phrase(status));

    let error = ApiError::from_status(status, message);

    match parsed.as_ref().and_then(|v| v.get("errors")).and_then(field_errors) {
        Some(fields) => error.with_field_errors(fields),
        None => error,
    }
}

fn reason_phrase(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

fn field_errors(errors: &Value) -> Option<BTreeMap<String, Vec<String>>> {
    let object = errors.as_object()?;

    let fields: BTreeMap<String, Vec<String>> = object
        .iter()
        .map(|(field, messages)| {
            let messages = match messages {
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
                Value::String(s) => vec![s.clone()],
                other => vec![other.to_string()],
            };
            (field.clone(), messages)
        })
        .collect();

    (!fields.is_empty()).then_some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ApiErrorCode;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TransportClient {
        let config = TransportConfig::new("pk_test", "sk_test").with_base_url(server.uri());
        TransportClient::new(config).unwrap()
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Request construction
    // ══════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn sends_credential_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/products"))
            .and(header(PUBLIC_KEY_HEADER, "pk_test"))
            .and(header(SECRET_KEY_HEADER, "sk_test"))
            .and(body_json(json!({"name": "Pro"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "prod_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let value = client_for(&server)
            .send_json(Method::POST, "/products", Some(&json!({"name": "Pro"})), None)
            .await
            .unwrap();

        assert_eq!(value, json!({"id": "prod_1"}));
    }

    #[tokio::test]
    async fn sends_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let query = vec![("limit".to_string(), "10".to_string())];
        let value = client_for(&server)
            .send_json(Method::GET, "products", None, Some(&query))
            .await
            .unwrap();

        assert_eq!(value, json!({"data": []}));
    }

    #[tokio::test]
    async fn empty_success_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/products/prod_1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let value = client_for(&server)
            .send_json(Method::DELETE, "/products/prod_1", None, None)
            .await
            .unwrap();

        assert_eq!(value, Value::Null);
    }

    #[test]
    fn joins_base_url_and_path() {
        let config = TransportConfig::new("pk", "sk").with_base_url("https://api.test/v1/");
        let client = TransportClient::new(config).unwrap();

        assert_eq!(client.url("/products"), "https://api.test/v1/products");
        assert_eq!(client.url("products"), "https://api.test/v1/products");
    }

    #[test]
    fn debug_does_not_leak_credentials() {
        let config = TransportConfig::new("pk_live_abc", "sk_live_xyz");
        let debug = format!("{:?}", config);

        assert!(!debug.contains("pk_live_abc"));
        assert!(!debug.contains("sk_live_xyz"));
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Error normalization
    // ══════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn validation_error_carries_field_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Validation failed",
                "errors": {"unit_price": ["must be positive"], "name": "is required"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_json(Method::POST, "/products", Some(&json!({})), None)
            .await
            .unwrap_err();

        assert_eq!(err.code, ApiErrorCode::ValidationFailed);
        assert_eq!(err.message, "Validation failed");
        assert_eq!(err.http_status, Some(422));

        let fields = err.field_errors.unwrap();
        assert_eq!(fields["unitPrice"], vec!["must be positive".to_string()]);
        assert_eq!(fields["name"], vec!["is required".to_string()]);
    }

    #[tokio::test]
    async fn maps_status_codes() {
        let cases = [
            (401, ApiErrorCode::Unauthorized, "Unauthorized"),
            (404, ApiErrorCode::NotFound, "Not Found"),
            (429, ApiErrorCode::RateLimited, "Too Many Requests"),
            (500, ApiErrorCode::ProviderError, "Internal Server Error"),
        ];

        for (status, expected, reason) in cases {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;

            let err = client_for(&server)
                .send_json(Method::GET, "/products/x", None, None)
                .await
                .unwrap_err();

            assert_eq!(err.code, expected, "status {}", status);
            assert_eq!(err.http_status, Some(status));
            assert_eq!(err.message, reason);
        }
    }

    #[tokio::test]
    async fn non_json_error_body_uses_reason_phrase() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(502).set_body_string("<html>upstream unavailable</html>"),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_json(Method::GET, "/products", None, None)
            .await
            .unwrap_err();

        assert_eq!(err.code, ApiErrorCode::ProviderError);
        assert_eq!(err.message, "Bad Gateway");
        assert!(err.field_errors.is_none());
    }

    #[tokio::test]
    async fn malformed_success_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_json(Method::GET, "/products", None, None)
            .await
            .unwrap_err();

        assert_eq!(err.code, ApiErrorCode::DecodeError);
        assert!(err.http_status.is_none());
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let config = TransportConfig::new("pk", "sk")
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(Duration::from_secs(2));
        let client = TransportClient::new(config).unwrap();

        let err = client
            .send_json(Method::GET, "/products", None, None)
            .await
            .unwrap_err();

        assert_eq!(err.code, ApiErrorCode::NetworkError);
        assert!(err.is_retryable());
    }

    #[test]
    fn error_body_without_message_uses_generic_text() {
        let err = error_from_response(400, r#"{"errors": {}}"#);

        assert_eq!(err.code, ApiErrorCode::ValidationFailed);
        assert_eq!(err.message, "Bad Request");
        assert!(err.field_errors.is_none());
    }
}
