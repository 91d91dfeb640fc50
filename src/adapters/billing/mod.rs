//! Billing provider adapters.
//!
//! - `HttpBillingProvider` - Talks to the provider's REST API
//! - `MockBillingProvider` - In-memory provider for tests

mod http_billing_provider;
mod mock_billing_provider;

pub use http_billing_provider::HttpBillingProvider;
pub use mock_billing_provider::{MethodCall, MockBillingProvider};
