//! HTTP handler for webhook deliveries.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::domain::webhook::{DispatchError, WebhookDispatcher, WebhookError, WebhookVerifier};

use super::dto::ErrorResponse;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the webhook endpoint.
#[derive(Clone)]
pub struct WebhookAppState {
    pub verifier: Arc<WebhookVerifier>,
    pub dispatcher: Arc<WebhookDispatcher>,
}

impl WebhookAppState {
    pub fn new(verifier: WebhookVerifier, dispatcher: WebhookDispatcher) -> Self {
        Self {
            verifier: Arc::new(verifier),
            dispatcher: Arc::new(dispatcher),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks - Verify and dispatch a provider webhook.
///
/// A verified event with no registered handler is acknowledged with 200 so the
/// provider does not keep redelivering it.
pub async fn receive_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let event = state.verifier.verify_headers(&body, &headers)?;

    match state.dispatcher.dispatch(event).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(DispatchError::UnregisteredEventType(event_type)) => {
            tracing::warn!(
                event_type = %event_type,
                "Ignoring webhook with no registered handler"
            );
            Ok(StatusCode::OK)
        }
        Err(err) => Err(err.into()),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts webhook errors to HTTP responses.
#[derive(Debug)]
pub enum WebhookApiError {
    Verification(WebhookError),
    Dispatch(DispatchError),
}

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self::Verification(err)
    }
}

impl From<DispatchError> for WebhookApiError {
    fn from(err: DispatchError) -> Self {
        Self::Dispatch(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code, message) = match &self {
            WebhookApiError::Verification(err) => {
                let code = match err {
                    WebhookError::Configuration(_) => "CONFIGURATION_ERROR",
                    WebhookError::MissingHeader(_) => "MISSING_HEADER",
                    WebhookError::MalformedHeader(_) => "MALFORMED_HEADER",
                    WebhookError::InvalidSignature => "INVALID_SIGNATURE",
                    WebhookError::Parse(_) => "INVALID_PAYLOAD",
                };
                let message = match err {
                    WebhookError::Configuration(detail) => {
                        tracing::error!(error = %detail, "Webhook verifier misconfigured");
                        "Internal error".to_string()
                    }
                    other => other.to_string(),
                };
                (err.status_code(), code, message)
            }
            WebhookApiError::Dispatch(err) => {
                tracing::error!(
                    event_type = %err.event_type(),
                    error = %err,
                    "Webhook handler failed"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "HANDLER_FAILED",
                    "Webhook handler failed".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(error_code, message))).into_response()
    }
}
