//! Webhook error types.
//!
//! Verification failures are deliberately coarse: a bad signature, a stale
//! timestamp and a timestamp from the future all surface as
//! [`WebhookError::InvalidSignature`].

use axum::http::StatusCode;
use thiserror::Error;

use super::event::EventType;

/// Errors that occur while verifying an inbound webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The signing secret is missing or unusable.
    #[error("Webhook configuration error: {0}")]
    Configuration(String),

    /// A required header was absent or not valid UTF-8.
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    /// A required header was present but could not be parsed.
    #[error("Malformed header: {0}")]
    MalformedHeader(&'static str),

    /// Signature did not match, or the timestamp is outside tolerance.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signature passed but the payload is not a recognised event.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl WebhookError {
    /// Maps the error to the HTTP status returned to the provider.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            WebhookError::MissingHeader(_)
            | WebhookError::MalformedHeader(_)
            | WebhookError::Parse(_) => StatusCode::BAD_REQUEST,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Errors that occur while dispatching a verified event.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the event's type.
    #[error("No handler registered for event type {0}")]
    UnregisteredEventType(EventType),

    /// The registered handler returned an error.
    #[error("Handler for {event_type} failed: {source}")]
    Handler {
        event_type: EventType,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl DispatchError {
    pub fn event_type(&self) -> EventType {
        match self {
            DispatchError::UnregisteredEventType(event_type) => *event_type,
            DispatchError::Handler { event_type, .. } => *event_type,
        }
    }
}
