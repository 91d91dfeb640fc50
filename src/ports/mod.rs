//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `BillingProvider` - Product and subscription operations against the provider API

mod billing_provider;

pub use billing_provider::{
    ApiError, ApiErrorCode, BillingInterval, BillingProvider, CancelSubscriptionRequest,
    CreateProductRequest, CreateSubscriptionRequest, DeletedProduct, ListProductsRequest,
    Product, ProductList, Subscription, SubscriptionStatus, UpdateProductRequest,
};
