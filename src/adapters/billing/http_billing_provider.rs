//! HTTP implementation of [`BillingProvider`].
//!
//! Every operation follows the same path: serialize the camelCase request,
//! convert keys to snake_case, send it through [`TransportClient`], convert
//! the response back to camelCase and deserialize it.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::adapters::http_client::TransportClient;
use crate::domain::casing::{from_wire, to_wire};
use crate::ports::{
    ApiError, ApiErrorCode, BillingProvider, CancelSubscriptionRequest, CreateProductRequest,
    CreateSubscriptionRequest, DeletedProduct, ListProductsRequest, Product, ProductList,
    Subscription, UpdateProductRequest,
};

/// Provider adapter speaking the provider's REST API.
#[derive(Debug, Clone)]
pub struct HttpBillingProvider {
    transport: TransportClient,
}

impl HttpBillingProvider {
    pub fn new(transport: TransportClient) -> Self {
        Self { transport }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: Option<Vec<(String, String)>>,
    ) -> Result<T, ApiError> {
        tracing::debug!(method = %method, path = %path, "Calling provider");

        let response = self
            .transport
            .send_json(method.clone(), path, body.as_ref(), query.as_deref())
            .await?;

        from_wire(response).map_err(|e| {
            tracing::warn!(method = %method, path = %path, error = %e, "Unexpected provider response");
            ApiError::decode(format!("Failed to parse provider response: {}", e))
        })
    }
}

/// Characters escaped inside a single path segment. `/`, `\`, `?` and `#`
/// would otherwise end the segment or the path.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Build `/{collection}/{id}`, keeping the id inside one segment.
fn resource_path(collection: &str, id: &str) -> Result<String, ApiError> {
    if id.is_empty() || id == "." || id == ".." {
        return Err(ApiError::new(
            ApiErrorCode::ValidationFailed,
            format!("Invalid resource id: {:?}", id),
        ));
    }
    Ok(format!(
        "/{}/{}",
        collection,
        utf8_percent_encode(id, PATH_SEGMENT)
    ))
}

fn encode<T: Serialize>(request: &T) -> Result<Value, ApiError> {
    to_wire(request).map_err(|e| ApiError::decode(format!("Failed to encode request: {}", e)))
}

/// Flatten a wire-format object into query pairs, skipping nulls.
fn query_pairs(value: Value) -> Vec<(String, String)> {
    match value {
        Value::Object(fields) => fields
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl BillingProvider for HttpBillingProvider {
    async fn create_product(&self, request: CreateProductRequest) -> Result<Product, ApiError> {
        let body = encode(&request)?;
        self.call(Method::POST, "/products", Some(body), None).await
    }

    async fn get_product(&self, product_id: &str) -> Result<Product, ApiError> {
        let path = resource_path("products", product_id)?;
        self.call(Method::GET, &path, None, None).await
    }

    async fn list_products(&self, request: ListProductsRequest) -> Result<ProductList, ApiError> {
        let query = query_pairs(encode(&request)?);
        let query = (!query.is_empty()).then_some(query);
        self.call(Method::GET, "/products", None, query).await
    }

    async fn update_product(
        &self,
        product_id: &str,
        request: UpdateProductRequest,
    ) -> Result<Product, ApiError> {
        let path = resource_path("products", product_id)?;
        let body = encode(&request)?;
        self.call(Method::PATCH, &path, Some(body), None).await
    }

    async fn delete_product(&self, product_id: &str) -> Result<DeletedProduct, ApiError> {
        let path = resource_path("products", product_id)?;
        let response = self
            .transport
            .send_json(Method::DELETE, &path, None, None)
            .await?;

        // Some deployments answer 204 with no body.
        if response.is_null() {
            return Ok(DeletedProduct {
                id: product_id.to_string(),
                deleted: true,
            });
        }

        from_wire(response)
            .map_err(|e| ApiError::decode(format!("Failed to parse provider response: {}", e)))
    }

    async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> Result<Subscription, ApiError> {
        let body = encode(&request)?;
        self.call(Method::POST, "/subscriptions", Some(body), None)
            .await
    }

    async fn get_subscription(&self, subscription_id: &str) -> Result<Subscription, ApiError> {
        let path = resource_path("subscriptions", subscription_id)?;
        self.call(Method::GET, &path, None, None).await
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        request: CancelSubscriptionRequest,
    ) -> Result<Subscription, ApiError> {
        let path = format!("{}/cancel", resource_path("subscriptions", subscription_id)?);
        let body = encode(&request)?;
        self.call(Method::POST, &path, Some(body), None).await
    }
}
