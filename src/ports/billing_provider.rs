//! Billing provider port for the product and subscription API.
//!
//! Defines the contract for the provider's resource operations. Each
//! operation is a single request/response round trip: no retries, no
//! caching, no idempotency tracking.
//!
//! # Design
//!
//! - **camelCase internally**: every type here serializes with camelCase keys;
//!   adapters translate to the provider's snake_case at the boundary
//! - **Uniform errors**: every failure is an [`ApiError`]

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Port for the provider's product and subscription endpoints.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Create a product.
    async fn create_product(&self, request: CreateProductRequest) -> Result<Product, ApiError>;

    /// Get a product by provider ID.
    async fn get_product(&self, product_id: &str) -> Result<Product, ApiError>;

    /// List products, one page at a time.
    async fn list_products(&self, request: ListProductsRequest) -> Result<ProductList, ApiError>;

    /// Update the given fields of a product.
    async fn update_product(
        &self,
        product_id: &str,
        request: UpdateProductRequest,
    ) -> Result<Product, ApiError>;

    /// Delete a product.
    async fn delete_product(&self, product_id: &str) -> Result<DeletedProduct, ApiError>;

    /// Subscribe a customer to a product.
    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<Subscription, ApiError>;

    /// Get a subscription by provider ID.
    async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription, ApiError>;

    /// Cancel a subscription.
    ///
    /// If `at_period_end` is set, the subscription stays active until the
    /// current period ends.
    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        request: CancelSubscriptionRequest,
    ) -> Result<Subscription, ApiError>;
}

// ════════════════════════════════════════════════════════════════════════════════
// Products
// ════════════════════════════════════════════════════════════════════════════════

/// Billing cadence of a recurring product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Day,
    Week,
    Month,
    Year,
}

/// Product in the provider's catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Provider's product ID.
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Price in the currency's minor unit.
    #[serde(default)]
    pub price: i64,

    #[serde(default)]
    pub currency: String,

    /// Recurrence; `None` for one-time products.
    #[serde(default)]
    pub interval: Option<BillingInterval>,

    #[serde(default = "default_active")]
    pub active: bool,

    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Unix timestamp.
    #[serde(default)]
    pub created_at: Option<i64>,

    /// Unix timestamp.
    #[serde(default)]
    pub updated_at: Option<i64>,
}

fn default_active() -> bool {
    true
}

/// Request to create a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Price in the currency's minor unit.
    pub price: i64,

    pub currency: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<BillingInterval>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Request to update a product. Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl UpdateProductRequest {
    /// True if no field would be sent.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.active.is_none()
            && self.metadata.is_none()
    }
}

/// Pagination and filtering for product listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Cursor: return products after this ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_after: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// One page of products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductList {
    pub data: Vec<Product>,

    #[serde(default)]
    pub has_more: bool,
}

/// Confirmation of a product deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedProduct {
    pub id: String,

    #[serde(default)]
    pub deleted: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

/// Subscription in the provider's system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Provider's subscription ID.
    pub id: String,

    /// Provider's customer ID.
    pub customer_id: String,

    #[serde(default)]
    pub product_id: Option<String>,

    pub status: SubscriptionStatus,

    /// Current billing period start (Unix timestamp).
    #[serde(default)]
    pub current_period_start: Option<i64>,

    /// Current billing period end (Unix timestamp).
    #[serde(default)]
    pub current_period_end: Option<i64>,

    /// Whether subscription cancels at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// When cancellation was requested (if applicable).
    #[serde(default)]
    pub canceled_at: Option<i64>,

    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Subscription status from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active and current.
    Active,

    /// Subscription is in trial period.
    Trialing,

    /// Payment is past due, grace period active.
    PastDue,

    /// Subscription is paused.
    Paused,

    /// Subscription is canceled (may still be active until period end).
    Canceled,

    /// Initial payment incomplete.
    Incomplete,

    /// Initial payment never completed.
    IncompleteExpired,

    /// Unknown status from provider.
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    /// Check if subscription grants access.
    pub fn has_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing | SubscriptionStatus::PastDue
        )
    }
}

/// Request to create a subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    /// Provider's customer ID.
    pub customer_id: String,

    /// Product to subscribe to.
    pub product_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_period_days: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// Request to cancel a subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    pub at_period_end: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Normalized error from any provider operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Error code for categorization.
    pub code: ApiErrorCode,

    /// Human-readable message.
    pub message: String,

    /// HTTP status returned by the provider, if a response arrived.
    pub http_status: Option<u16>,

    /// Per-field validation messages, keyed by field name.
    pub field_errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            http_status: None,
            field_errors: None,
        }
    }

    /// Create the error for a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::from_http_status(status), message).with_http_status(status)
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_field_errors(mut self, errors: BTreeMap<String, Vec<String>>) -> Self {
        self.field_errors = Some(errors);
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::NetworkError, message)
    }

    /// Create an error for a response body that could not be decoded.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::DecodeError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(ApiErrorCode::NotFound, format!("{} not found", resource)).with_http_status(404)
    }

    /// Whether a caller might reasonably retry. Nothing here retries on its own.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorCode {
    /// Network connectivity issue; no response received.
    NetworkError,

    /// Credentials rejected (401/403).
    Unauthorized,

    /// Resource not found.
    NotFound,

    /// Request rejected by provider validation (400/422).
    ValidationFailed,

    /// Rate limit exceeded.
    RateLimited,

    /// Any other provider-side failure.
    ProviderError,

    /// Response body did not match the expected shape.
    DecodeError,
}

impl ApiErrorCode {
    /// Categorize a non-success HTTP status.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 | 403 => ApiErrorCode::Unauthorized,
            404 => ApiErrorCode::NotFound,
            400 | 422 => ApiErrorCode::ValidationFailed,
            429 => ApiErrorCode::RateLimited,
            _ => ApiErrorCode::ProviderError,
        }
    }

    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiErrorCode::NetworkError | ApiErrorCode::RateLimited)
    }
}

impl std::fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApiErrorCode::NetworkError => "network_error",
            ApiErrorCode::Unauthorized => "unauthorized",
            ApiErrorCode::NotFound => "not_found",
            ApiErrorCode::ValidationFailed => "validation_failed",
            ApiErrorCode::RateLimited => "rate_limited",
            ApiErrorCode::ProviderError => "provider_error",
            ApiErrorCode::DecodeError => "decode_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Trait object safety test
    #[test]
    fn billing_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn BillingProvider) {}
    }

    #[test]
    fn subscription_status_access_checks() {
        assert!(SubscriptionStatus::Active.has_access());
        assert!(SubscriptionStatus::Trialing.has_access());
        assert!(SubscriptionStatus::PastDue.has_access());

        assert!(!SubscriptionStatus::Paused.has_access());
        assert!(!SubscriptionStatus::Canceled.has_access());
        assert!(!SubscriptionStatus::Incomplete.has_access());
    }

    #[test]
    fn unknown_subscription_status_is_tolerated() {
        let status: SubscriptionStatus = serde_json::from_value(json!("on_hold")).unwrap();
        assert_eq!(status, SubscriptionStatus::Unknown);
    }

    #[test]
    fn product_defaults_fill_missing_fields() {
        let product: Product = serde_json::from_value(json!({
            "id": "prod_1",
            "name": "Pro"
        }))
        .unwrap();

        assert!(product.active);
        assert_eq!(product.price, 0);
        assert!(product.interval.is_none());
        assert!(product.metadata.is_empty());
    }

    #[test]
    fn create_product_request_omits_unset_fields() {
        let request = CreateProductRequest {
            name: "Pro".to_string(),
            price: 1999,
            currency: "usd".to_string(),
            interval: Some(BillingInterval::Month),
            ..Default::default()
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"name": "Pro", "price": 1999, "currency": "usd", "interval": "month"})
        );
    }

    #[test]
    fn update_product_request_is_empty() {
        assert!(UpdateProductRequest::default().is_empty());
        let request = UpdateProductRequest {
            active: Some(false),
            ..Default::default()
        };
        assert!(!request.is_empty());
    }

    #[test]
    fn http_status_categories() {
        assert_eq!(ApiErrorCode::from_http_status(401), ApiErrorCode::Unauthorized);
        assert_eq!(ApiErrorCode::from_http_status(403), ApiErrorCode::Unauthorized);
        assert_eq!(ApiErrorCode::from_http_status(404), ApiErrorCode::NotFound);
        assert_eq!(ApiErrorCode::from_http_status(422), ApiErrorCode::ValidationFailed);
        assert_eq!(ApiErrorCode::from_http_status(429), ApiErrorCode::RateLimited);
        assert_eq!(ApiErrorCode::from_http_status(502), ApiErrorCode::ProviderError);
    }

    #[test]
    fn api_error_retryable() {
        assert!(ApiError::network("connection reset").is_retryable());
        assert!(ApiError::from_status(429, "slow down").is_retryable());

        assert!(!ApiError::from_status(422, "invalid").is_retryable());
        assert!(!ApiError::not_found("Product").is_retryable());
    }

    #[test]
    fn api_error_display() {
        let err = ApiError::not_found("Product");
        assert_eq!(err.to_string(), "not_found: Product not found");
        assert_eq!(err.http_status, Some(404));
    }

    #[test]
    fn api_error_carries_field_errors() {
        let mut fields = BTreeMap::new();
        fields.insert("price".to_string(), vec!["must be positive".to_string()]);

        let err = ApiError::from_status(422, "Validation failed").with_field_errors(fields);

        assert_eq!(err.code, ApiErrorCode::ValidationFailed);
        assert_eq!(
            err.field_errors.unwrap()["price"],
            vec!["must be positive".to_string()]
        );
    }
}
