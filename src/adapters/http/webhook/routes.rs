//! Axum router configuration for the webhook endpoint.

use axum::{routing::post, Router};

use super::handlers::{receive_webhook, WebhookAppState};

/// Create the webhook router.
///
/// Webhooks carry no user authentication; each delivery is verified by its
/// signature instead.
///
/// # Routes
/// - `POST /` - Receive a webhook delivery
pub fn webhook_routes() -> Router<WebhookAppState> {
    Router::new().route("/", post(receive_webhook))
}

/// Create the complete webhook router, mounted at `/webhooks`.
pub fn webhook_router() -> Router<WebhookAppState> {
    Router::new().nest("/webhooks", webhook_routes())
}
