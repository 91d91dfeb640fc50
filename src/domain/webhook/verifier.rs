//! Webhook signature verification.
//!
//! Deliveries carry three headers: a message id, a Unix timestamp and a
//! space-separated list of versioned signatures (`v1,<base64>`). The signed
//! content is `{id}.{timestamp}.{body}`, keyed with HMAC-SHA256 over the
//! decoded signing secret.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use http::HeaderMap;
use secrecy::{ExposeSecret, SecretVec};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::event::{EventType, WebhookEvent};
use crate::domain::casing::to_camel_case_keys;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the unique message id.
pub const HEADER_ID: &str = "webhook-id";

/// Header carrying the Unix timestamp of the delivery attempt.
pub const HEADER_TIMESTAMP: &str = "webhook-timestamp";

/// Header carrying the signature list.
pub const HEADER_SIGNATURE: &str = "webhook-signature";

/// Default tolerance, in either direction, for the delivery timestamp.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";

/// The three header values that, with the raw body, form the verification input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

impl WebhookHeaders {
    pub fn new(
        id: impl Into<String>,
        timestamp: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: timestamp.into(),
            signature: signature.into(),
        }
    }

    /// Extracts the verification headers from an HTTP header map.
    ///
    /// # Errors
    ///
    /// `MissingHeader` if any of the three headers is absent or not UTF-8.
    pub fn from_header_map(headers: &HeaderMap) -> Result<Self, WebhookError> {
        Ok(Self {
            id: header_value(headers, HEADER_ID)?,
            timestamp: header_value(headers, HEADER_TIMESTAMP)?,
            signature: header_value(headers, HEADER_SIGNATURE)?,
        })
    }
}

fn header_value(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or(WebhookError::MissingHeader(name))
}

/// Verifies webhook deliveries against a single signing secret.
pub struct WebhookVerifier {
    key: SecretVec<u8>,
    tolerance: Duration,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("key", &"[REDACTED]")
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

impl WebhookVerifier {
    /// Creates a verifier for the given signing secret.
    ///
    /// The `whsec_` prefix is optional; the remainder must be base64.
    ///
    /// # Errors
    ///
    /// `Configuration` if the secret is empty or not valid base64.
    pub fn new(secret: &str) -> Result<Self, WebhookError> {
        Ok(Self {
            key: SecretVec::new(decode_signing_secret(secret)?),
            tolerance: DEFAULT_TOLERANCE,
        })
    }

    /// Overrides the accepted timestamp drift.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Verifies a delivery against the current time and parses the event.
    pub fn verify(
        &self,
        payload: &[u8],
        headers: &WebhookHeaders,
    ) -> Result<WebhookEvent, WebhookError> {
        self.verify_at(payload, headers, Utc::now())
    }

    /// Extracts the headers from `headers` and verifies the delivery.
    pub fn verify_headers(
        &self,
        payload: &[u8],
        headers: &HeaderMap,
    ) -> Result<WebhookEvent, WebhookError> {
        let headers = WebhookHeaders::from_header_map(headers)?;
        self.verify(payload, &headers)
    }

    /// Verifies a delivery as of `now` and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the timestamp header
    /// 2. Reject timestamps outside the tolerance window
    /// 3. Compute the expected signature using HMAC-SHA256
    /// 4. Compare against every `v1` signature in constant time
    /// 5. Parse the payload, convert its keys, and build the typed event
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` - Timestamp is not an integer, or no `v1` signature present
    /// - `InvalidSignature` - No signature matched, or the timestamp is stale
    /// - `Parse` - Payload is not a recognised event
    pub fn verify_at(
        &self,
        payload: &[u8],
        headers: &WebhookHeaders,
        now: DateTime<Utc>,
    ) -> Result<WebhookEvent, WebhookError> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| WebhookError::MalformedHeader(HEADER_TIMESTAMP))?;

        self.validate_timestamp(timestamp, now)?;

        let expected = self.compute_signature(&headers.id, &headers.timestamp, payload)?;
        let candidates = parse_signatures(&headers.signature)?;

        let matched = candidates
            .iter()
            .any(|candidate| constant_time_compare(&expected, candidate));

        if !matched {
            tracing::warn!(
                message_id = %headers.id,
                candidates = candidates.len(),
                "Webhook signature mismatch"
            );
            return Err(WebhookError::InvalidSignature);
        }

        let event = parse_event(payload)?;

        tracing::info!(
            message_id = %headers.id,
            event_type = %event.event_type(),
            "Webhook signature verified"
        );

        Ok(event)
    }

    /// Produces a `v1,<base64>` signature for the given delivery.
    ///
    /// # Errors
    ///
    /// `Configuration` if the key cannot initialise the MAC.
    pub fn sign(
        &self,
        message_id: &str,
        timestamp: i64,
        payload: &[u8],
    ) -> Result<String, WebhookError> {
        let signature = self.compute_signature(message_id, &timestamp.to_string(), payload)?;
        Ok(format!("{},{}", SIGNATURE_VERSION, STANDARD.encode(signature)))
    }

    fn validate_timestamp(&self, timestamp: i64, now: DateTime<Utc>) -> Result<(), WebhookError> {
        let drift = now.timestamp().abs_diff(timestamp);
        if drift > self.tolerance.as_secs() {
            tracing::warn!(
                event_timestamp = timestamp,
                current_time = now.timestamp(),
                drift_secs = drift,
                "Webhook timestamp outside tolerance - possible replay"
            );
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }

    fn compute_signature(
        &self,
        message_id: &str,
        timestamp: &str,
        payload: &[u8],
    ) -> Result<Vec<u8>, WebhookError> {
        let mut mac = HmacSha256::new_from_slice(self.key.expose_secret())
            .map_err(|e| WebhookError::Configuration(e.to_string()))?;
        mac.update(message_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Decodes a signing secret into HMAC key bytes.
///
/// # Errors
///
/// `Configuration` if the secret is empty or not valid base64.
pub fn decode_signing_secret(secret: &str) -> Result<Vec<u8>, WebhookError> {
    let encoded = secret.trim();
    let encoded = encoded.strip_prefix(SECRET_PREFIX).unwrap_or(encoded);
    if encoded.is_empty() {
        return Err(WebhookError::Configuration(
            "signing secret is empty".to_string(),
        ));
    }
    STANDARD.decode(encoded).map_err(|_| {
        WebhookError::Configuration("signing secret is not valid base64".to_string())
    })
}

/// Collects the decoded `v1` signatures from the signature header.
///
/// Entries with other versions, or that fail to decode, are skipped.
fn parse_signatures(header: &str) -> Result<Vec<Vec<u8>>, WebhookError> {
    let signatures: Vec<Vec<u8>> = header
        .split_whitespace()
        .filter_map(|entry| entry.split_once(','))
        .filter(|(version, _)| *version == SIGNATURE_VERSION)
        .filter_map(|(_, encoded)| STANDARD.decode(encoded).ok())
        .collect();

    if signatures.is_empty() {
        return Err(WebhookError::MalformedHeader(HEADER_SIGNATURE));
    }
    Ok(signatures)
}

fn parse_event(payload: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let raw: Value =
        serde_json::from_slice(payload).map_err(|e| WebhookError::Parse(e.to_string()))?;
    let converted = to_camel_case_keys(raw);

    let tag = converted
        .get("eventType")
        .and_then(Value::as_str)
        .ok_or_else(|| WebhookError::Parse("missing event_type".to_string()))?;
    tag.parse::<EventType>()
        .map_err(|e| WebhookError::Parse(e.to_string()))?;

    serde_json::from_value(converted).map_err(|e| WebhookError::Parse(e.to_string()))
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
