//! Typed webhook events.
//!
//! Events arrive with `snake_case` keys and are converted to `camelCase`
//! before deserialization, so every payload type here uses camelCase names.
//! Unknown fields are kept in `extra` so the event always reflects the exact
//! object the provider sent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire tag identifying the kind of webhook event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "payment_intent.succeeded")]
    PaymentSucceeded,
    #[serde(rename = "payment_intent.failed")]
    PaymentFailed,
    #[serde(rename = "subscription.create")]
    SubscriptionCreated,
    #[serde(rename = "subscription.past_due")]
    SubscriptionPastDue,
    #[serde(rename = "subscription.paused")]
    SubscriptionPaused,
    #[serde(rename = "subscription.cancel")]
    SubscriptionCanceled,
}

impl EventType {
    /// Every event type the provider sends.
    pub const ALL: [EventType; 6] = [
        EventType::PaymentSucceeded,
        EventType::PaymentFailed,
        EventType::SubscriptionCreated,
        EventType::SubscriptionPastDue,
        EventType::SubscriptionPaused,
        EventType::SubscriptionCanceled,
    ];

    /// The wire representation of this tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::PaymentSucceeded => "payment_intent.succeeded",
            EventType::PaymentFailed => "payment_intent.failed",
            EventType::SubscriptionCreated => "subscription.create",
            EventType::SubscriptionPastDue => "subscription.past_due",
            EventType::SubscriptionPaused => "subscription.paused",
            EventType::SubscriptionCanceled => "subscription.cancel",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known event tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown event type: {0}")]
pub struct UnknownEventType(pub String);

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|event_type| event_type.as_str() == s)
            .ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

/// Payload of `payment_intent.succeeded`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    /// Amount in the currency's minor unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of `payment_intent.failed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFailedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload shared by the subscription lifecycle events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Unix timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_period_end: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A verified webhook event, discriminated by `eventType`.
///
/// Only [`super::WebhookVerifier`] produces these from untrusted input, which
/// guarantees the tag always matches the payload shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType")]
pub enum WebhookEvent {
    #[serde(rename = "payment_intent.succeeded")]
    PaymentSucceeded(PaymentIntentPayload),
    #[serde(rename = "payment_intent.failed")]
    PaymentFailed(PaymentFailedPayload),
    #[serde(rename = "subscription.create")]
    SubscriptionCreated(SubscriptionPayload),
    #[serde(rename = "subscription.past_due")]
    SubscriptionPastDue(SubscriptionPayload),
    #[serde(rename = "subscription.paused")]
    SubscriptionPaused(SubscriptionPayload),
    #[serde(rename = "subscription.cancel")]
    SubscriptionCanceled(SubscriptionPayload),
}

impl WebhookEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            WebhookEvent::PaymentSucceeded(_) => EventType::PaymentSucceeded,
            WebhookEvent::PaymentFailed(_) => EventType::PaymentFailed,
            WebhookEvent::SubscriptionCreated(_) => EventType::SubscriptionCreated,
            WebhookEvent::SubscriptionPastDue(_) => EventType::SubscriptionPastDue,
            WebhookEvent::SubscriptionPaused(_) => EventType::SubscriptionPaused,
            WebhookEvent::SubscriptionCanceled(_) => EventType::SubscriptionCanceled,
        }
    }

    /// Customer the event concerns, if the provider included one.
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            WebhookEvent::PaymentSucceeded(p) => p.customer_id.as_deref(),
            WebhookEvent::PaymentFailed(p) => p.customer_id.as_deref(),
            WebhookEvent::SubscriptionCreated(p)
            | WebhookEvent::SubscriptionPastDue(p)
            | WebhookEvent::SubscriptionPaused(p)
            | WebhookEvent::SubscriptionCanceled(p) => p.customer_id.as_deref(),
        }
    }

    /// The event as a camelCase JSON object, including `eventType`.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
