//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http_client` - JSON transport to the provider API
//! - `billing` - `BillingProvider` implementations (HTTP, mock)
//! - `http` - Inbound HTTP endpoints (webhooks)

pub mod billing;
pub mod http;
pub mod http_client;

pub use billing::{HttpBillingProvider, MockBillingProvider};
pub use http_client::{TransportClient, TransportConfig};
