//! Billing Gateway webhook receiver.
//!
//! Serves `POST /webhooks`, verifying each delivery and logging the event.
//! Cancellations are confirmed against the provider API before being logged.

use std::sync::Arc;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use billing_gateway::adapters::http::{webhook_router, WebhookAppState};
use billing_gateway::adapters::{HttpBillingProvider, TransportClient};
use billing_gateway::config::AppConfig;
use billing_gateway::domain::webhook::WebhookDispatcher;
use billing_gateway::ports::BillingProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    setup_tracing(&config);

    let verifier = config
        .webhook
        .verifier()
        .context("Failed to build webhook verifier")?;
    let transport = TransportClient::new(config.provider.transport_config())
        .context("Failed to build provider client")?;
    let provider: Arc<dyn BillingProvider> = Arc::new(HttpBillingProvider::new(transport));

    let dispatcher = WebhookDispatcher::with_logging_handlers();
    dispatcher.on_subscription_canceled(move |payload| {
        let provider = provider.clone();
        async move {
            let Some(id) = payload.subscription_id else {
                tracing::warn!(
                    customer_id = ?payload.customer_id,
                    "Cancellation without subscription id"
                );
                return anyhow::Ok(());
            };
            let current = provider.get_subscription(&id).await?;
            tracing::info!(
                subscription_id = %id,
                status = ?current.status,
                has_access = current.status.has_access(),
                "Subscription canceled"
            );
            anyhow::Ok(())
        }
    });
    let state = WebhookAppState::new(verifier, dispatcher);

    let app = webhook_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        address = %addr,
        environment = %config.server.environment,
        provider = %config.provider.base_url,
        request_timeout_secs = config.provider.request_timeout_secs,
        "Billing gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Billing gateway stopped");
    Ok(())
}

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
fn setup_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
