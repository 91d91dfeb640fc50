//! HTTP adapter for inbound provider webhooks.
//!
//! - `POST /webhooks` - Verify, parse and dispatch a webhook delivery

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::ErrorResponse;
pub use handlers::{receive_webhook, WebhookApiError, WebhookAppState};
pub use routes::{webhook_router, webhook_routes};
