//! Mock billing provider for testing.
//!
//! Provides an in-memory implementation of `BillingProvider` for unit and
//! integration tests. Supports:
//! - Stateful products and subscriptions
//! - Error injection
//! - Call tracking

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::ports::{
    ApiError, BillingProvider, CancelSubscriptionRequest, CreateProductRequest,
    CreateSubscriptionRequest, DeletedProduct, ListProductsRequest, Product, ProductList,
    Subscription, SubscriptionStatus, UpdateProductRequest,
};

const DEFAULT_PAGE_SIZE: usize = 10;
const PERIOD_SECS: i64 = 30 * 24 * 60 * 60;

/// Mock billing provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockBillingProvider::new();
///
/// // Inject errors
/// mock.set_method_error("get_product", ApiError::not_found("Product"));
///
/// // Use in tests
/// let result = mock.create_product(request).await;
/// assert!(mock.was_called("create_product"));
/// ```
#[derive(Default, Clone)]
pub struct MockBillingProvider {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// Products keyed by ID; IDs sort in creation order.
    products: BTreeMap<String, Product>,

    subscriptions: HashMap<String, Subscription>,

    next_id: u64,

    /// Error to return on next call.
    next_error: Option<ApiError>,

    /// Specific errors by method name.
    method_errors: HashMap<String, ApiError>,

    call_log: Vec<MethodCall>,
}

impl MockState {
    fn generate_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}_mock_{:06}", prefix, self.next_id)
    }
}

/// Recorded method call for assertions.
#[derive(Debug, Clone)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    /// Store a product as if the provider already had it.
    pub fn add_product(&self, product: Product) {
        self.state().products.insert(product.id.clone(), product);
    }

    /// Store a subscription as if the provider already had it.
    pub fn add_subscription(&self, subscription: Subscription) {
        self.state()
            .subscriptions
            .insert(subscription.id.clone(), subscription);
    }

    /// Set an error to return on the next call to any method.
    pub fn set_error(&self, error: ApiError) {
        self.state().next_error = Some(error);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: ApiError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.next_error = None;
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn was_called(&self, method: &str) -> bool {
        self.state().call_log.iter().any(|c| c.method == method)
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call, then returns any injected error for it.
    fn begin(&self, method: &str, args: Vec<String>) -> Result<(), ApiError> {
        let mut state = self.state();
        state.call_log.push(MethodCall {
            method: method.to_string(),
            args,
        });

        if let Some(error) = state.method_errors.get(method) {
            return Err(error.clone());
        }
        if let Some(error) = state.next_error.take() {
            return Err(error);
        }
        Ok(())
    }
}

#[async_trait]
impl BillingProvider for MockBillingProvider {
    async fn create_product(&self, request: CreateProductRequest) -> Result<Product, ApiError> {
        self.begin("create_product", vec![request.name.clone()])?;

        let mut state = self.state();
        let now = chrono::Utc::now().timestamp();
        let product = Product {
            id: state.generate_id("prod"),
            name: request.name,
            description: request.description,
            price: request.price,
            currency: request.currency,
            interval: request.interval,
            active: true,
            metadata: request.metadata.unwrap_or_default(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        state.products.insert(product.id.clone(), product.clone());

        Ok(product)
    }

    async fn get_product(&self, product_id: &str) -> Result<Product, ApiError> {
        self.begin("get_product", vec![product_id.to_string()])?;

        self.state()
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Product"))
    }

    async fn list_products(&self, request: ListProductsRequest) -> Result<ProductList, ApiError> {
        self.begin(
            "list_products",
            vec![format!("{:?}", request.limit), format!("{:?}", request.starting_after)],
        )?;

        let limit = request.limit.map(|l| l as usize).unwrap_or(DEFAULT_PAGE_SIZE);
        let state = self.state();

        let mut matching = state
            .products
            .values()
            .filter(|p| match &request.starting_after {
                Some(cursor) => p.id.as_str() > cursor.as_str(),
                None => true,
            })
            .filter(|p| request.active.map_or(true, |active| p.active == active));

        let data: Vec<Product> = matching.by_ref().take(limit).cloned().collect();
        let has_more = matching.next().is_some();

        Ok(ProductList { data, has_more })
    }

    async fn update_product(
        &self,
        product_id: &str,
        request: UpdateProductRequest,
    ) -> Result<Product, ApiError> {
        self.begin("update_product", vec![product_id.to_string()])?;

        let mut state = self.state();
        let product = state
            .products
            .get_mut(product_id)
            .ok_or_else(|| ApiError::not_found("Product"))?;

        if let Some(name) = request.name {
            product.name = name;
        }
        if let Some(description) = request.description {
            product.description = Some(description);
        }
        if let Some(price) = request.price {
            product.price = price;
        }
        if let Some(active) = request.active {
            product.active = active;
        }
        if let Some(metadata) = request.metadata {
            product.metadata = metadata;
        }
        product.updated_at = Some(chrono::Utc::now().timestamp());

        Ok(product.clone())
    }

    async fn delete_product(&self, product_id: &str) -> Result<DeletedProduct, ApiError> {
        self.begin("delete_product", vec![product_id.to_string()])?;

        self.state()
            .products
            .remove(product_id)
            .map(|product| DeletedProduct {
                id: product.id,
                deleted: true,
            })
            .ok_or_else(|| ApiError::not_found("Product"))
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<Subscription, ApiError> {
        self.begin(
            "create_subscription",
            vec![request.customer_id.clone(), request.product_id.clone()],
        )?;

        let mut state = self.state();
        if !state.products.contains_key(&request.product_id) {
            return Err(ApiError::not_found("Product"));
        }

        let now = chrono::Utc::now().timestamp();
        let status = match request.trial_period_days {
            Some(days) if days > 0 => SubscriptionStatus::Trialing,
            _ => SubscriptionStatus::Active,
        };

        let subscription = Subscription {
            id: state.generate_id("sub"),
            customer_id: request.customer_id,
            product_id: Some(request.product_id),
            status,
            current_period_start: Some(now),
            current_period_end: Some(now + PERIOD_SECS),
            cancel_at_period_end: false,
            canceled_at: None,
            metadata: request.metadata.unwrap_or_default(),
        };
        state
            .subscriptions
            .insert(subscription.id.clone(), subscription.clone());

        Ok(subscription)
    }

    async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription, ApiError> {
        self.begin("get_subscription", vec![subscription_id.to_string()])?;

        self.state()
            .subscriptions
            .get(subscription_id)
            .cloned()
            .ok_or_else(|| ApiError::not_found("Subscription"))
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        request: CancelSubscriptionRequest,
    ) -> Result<Subscription, ApiError> {
        self.begin(
            "cancel_subscription",
            vec![subscription_id.to_string(), request.at_period_end.to_string()],
        )?;

        let mut state = self.state();
        let subscription = state
            .subscriptions
            .get_mut(subscription_id)
            .ok_or_else(|| ApiError::not_found("Subscription"))?;

        subscription.cancel_at_period_end = request.at_period_end;
        subscription.canceled_at = Some(chrono::Utc::now().timestamp());

        if !request.at_period_end {
            subscription.status = SubscriptionStatus::Canceled;
        }

        Ok(subscription.clone())
    }
}
