//! HTTP adapters - Inbound REST endpoints.

pub mod webhook;

pub use webhook::{webhook_router, WebhookAppState};
