//! Routing of verified webhook events to registered handlers.
//!
//! The registry holds at most one handler per [`EventType`]. Each handler is
//! typed to its variant's payload, so the table cannot pair a tag with the
//! wrong payload shape.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::BoxFuture;
use futures::FutureExt;

use super::errors::DispatchError;
use super::event::{
    EventType, PaymentFailedPayload, PaymentIntentPayload, SubscriptionPayload, WebhookEvent,
};

/// An async handler for one payload type.
pub type HandlerFn<P> = Arc<dyn Fn(P) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A handler bound to exactly one event type.
#[derive(Clone)]
pub enum WebhookHandler {
    PaymentSucceeded(HandlerFn<PaymentIntentPayload>),
    PaymentFailed(HandlerFn<PaymentFailedPayload>),
    SubscriptionCreated(HandlerFn<SubscriptionPayload>),
    SubscriptionPastDue(HandlerFn<SubscriptionPayload>),
    SubscriptionPaused(HandlerFn<SubscriptionPayload>),
    SubscriptionCanceled(HandlerFn<SubscriptionPayload>),
}

fn boxed<P, F, Fut>(handler: F) -> HandlerFn<P>
where
    P: Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |payload| handler(payload).boxed())
}

impl WebhookHandler {
    pub fn payment_succeeded<F, Fut>(handler: F) -> Self
    where
        F: Fn(PaymentIntentPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        WebhookHandler::PaymentSucceeded(boxed(handler))
    }

    pub fn payment_failed<F, Fut>(handler: F) -> Self
    where
        F: Fn(PaymentFailedPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        WebhookHandler::PaymentFailed(boxed(handler))
    }

    pub fn subscription_created<F, Fut>(handler: F) -> Self
    where
        F: Fn(SubscriptionPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        WebhookHandler::SubscriptionCreated(boxed(handler))
    }

    pub fn subscription_past_due<F, Fut>(handler: F) -> Self
    where
        F: Fn(SubscriptionPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        WebhookHandler::SubscriptionPastDue(boxed(handler))
    }

    pub fn subscription_paused<F, Fut>(handler: F) -> Self
    where
        F: Fn(SubscriptionPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        WebhookHandler::SubscriptionPaused(boxed(handler))
    }

    pub fn subscription_canceled<F, Fut>(handler: F) -> Self
    where
        F: Fn(SubscriptionPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        WebhookHandler::SubscriptionCanceled(boxed(handler))
    }

    /// The tag this handler is registered under.
    pub fn event_type(&self) -> EventType {
        match self {
            WebhookHandler::PaymentSucceeded(_) => EventType::PaymentSucceeded,
            WebhookHandler::PaymentFailed(_) => EventType::PaymentFailed,
            WebhookHandler::SubscriptionCreated(_) => EventType::SubscriptionCreated,
            WebhookHandler::SubscriptionPastDue(_) => EventType::SubscriptionPastDue,
            WebhookHandler::SubscriptionPaused(_) => EventType::SubscriptionPaused,
            WebhookHandler::SubscriptionCanceled(_) => EventType::SubscriptionCanceled,
        }
    }

    /// Starts the handler if `event` is of this handler's type.
    fn invoke(&self, event: WebhookEvent) -> Option<BoxFuture<'static, anyhow::Result<()>>> {
        match (self, event) {
            (WebhookHandler::PaymentSucceeded(h), WebhookEvent::PaymentSucceeded(p)) => Some(h(p)),
            (WebhookHandler::PaymentFailed(h), WebhookEvent::PaymentFailed(p)) => Some(h(p)),
            (WebhookHandler::SubscriptionCreated(h), WebhookEvent::SubscriptionCreated(p)) => {
                Some(h(p))
            }
            (WebhookHandler::SubscriptionPastDue(h), WebhookEvent::SubscriptionPastDue(p)) => {
                Some(h(p))
            }
            (WebhookHandler::SubscriptionPaused(h), WebhookEvent::SubscriptionPaused(p)) => {
                Some(h(p))
            }
            (WebhookHandler::SubscriptionCanceled(h), WebhookEvent::SubscriptionCanceled(p)) => {
                Some(h(p))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for WebhookHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WebhookHandler")
            .field(&self.event_type())
            .finish()
    }
}

/// Registry of one handler per event type.
///
/// Registration is last-write-wins: registering a second handler for a tag
/// replaces the first, which supports re-registration on hot reload.
/// Callers that need a deterministic table should register everything before
/// the first dispatch.
pub struct WebhookDispatcher {
    handlers: RwLock<HashMap<EventType, WebhookHandler>>,
}

impl WebhookDispatcher {
    /// Creates a dispatcher with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a dispatcher that logs every event type.
    pub fn with_logging_handlers() -> Self {
        let dispatcher = Self::new();
        dispatcher
            .on_payment_succeeded(|p| async move {
                tracing::info!(
                    payment_intent_id = ?p.payment_intent_id,
                    customer_id = ?p.customer_id,
                    amount = ?p.amount,
                    currency = ?p.currency,
                    "Payment succeeded"
                );
                anyhow::Ok(())
            })
            .on_payment_failed(|p| async move {
                tracing::info!(
                    payment_intent_id = ?p.payment_intent_id,
                    customer_id = ?p.customer_id,
                    failure_code = ?p.failure_code,
                    "Payment failed"
                );
                anyhow::Ok(())
            })
            .on_subscription_created(|p| async move {
                log_subscription(EventType::SubscriptionCreated, &p);
                anyhow::Ok(())
            })
            .on_subscription_past_due(|p| async move {
                log_subscription(EventType::SubscriptionPastDue, &p);
                anyhow::Ok(())
            })
            .on_subscription_paused(|p| async move {
                log_subscription(EventType::SubscriptionPaused, &p);
                anyhow::Ok(())
            })
            .on_subscription_canceled(|p| async move {
                log_subscription(EventType::SubscriptionCanceled, &p);
                anyhow::Ok(())
            });
        dispatcher
    }

    /// Registers a handler, returning the one it replaced.
    pub fn register(&self, handler: WebhookHandler) -> Option<WebhookHandler> {
        let event_type = handler.event_type();
        let previous = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(event_type, handler);

        tracing::debug!(
            event_type = %event_type,
            replaced = previous.is_some(),
            "Webhook handler registered"
        );
        previous
    }

    pub fn on_payment_succeeded<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(PaymentIntentPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(WebhookHandler::payment_succeeded(handler));
        self
    }

    pub fn on_payment_failed<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(PaymentFailedPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(WebhookHandler::payment_failed(handler));
        self
    }

    pub fn on_subscription_created<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(SubscriptionPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(WebhookHandler::subscription_created(handler));
        self
    }

    pub fn on_subscription_past_due<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(SubscriptionPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(WebhookHandler::subscription_past_due(handler));
        self
    }

    pub fn on_subscription_paused<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(SubscriptionPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(WebhookHandler::subscription_paused(handler));
        self
    }

    pub fn on_subscription_canceled<F, Fut>(&self, handler: F) -> &Self
    where
        F: Fn(SubscriptionPayload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(WebhookHandler::subscription_canceled(handler));
        self
    }

    pub fn is_registered(&self, event_type: EventType) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&event_type)
    }

    /// Registered tags, in declaration order.
    pub fn registered_types(&self) -> Vec<EventType> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let mut types: Vec<EventType> = handlers.keys().copied().collect();
        types.sort();
        types
    }

    /// Routes `event` to its handler and waits for it to finish.
    ///
    /// # Errors
    ///
    /// - `UnregisteredEventType` - No handler for the event's tag; nothing is invoked
    /// - `Handler` - The handler itself failed
    pub async fn dispatch(&self, event: WebhookEvent) -> Result<(), DispatchError> {
        let event_type = event.event_type();

        // Clone the handler so the lock is released before awaiting it
        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event_type)
            .cloned();

        let Some(handler) = handler else {
            tracing::warn!(event_type = %event_type, "No handler registered for webhook event");
            return Err(DispatchError::UnregisteredEventType(event_type));
        };

        let pending = handler
            .invoke(event)
            .ok_or(DispatchError::UnregisteredEventType(event_type))?;

        pending.await.map_err(|e| {
            tracing::warn!(event_type = %event_type, error = %e, "Webhook handler failed");
            DispatchError::Handler {
                event_type,
                source: e.into(),
            }
        })?;

        tracing::debug!(event_type = %event_type, "Webhook event dispatched");
        Ok(())
    }
}

impl Default for WebhookDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("registered", &self.registered_types())
            .finish()
    }
}

fn log_subscription(event_type: EventType, payload: &SubscriptionPayload) {
    tracing::info!(
        event_type = %event_type,
        subscription_id = ?payload.subscription_id,
        customer_id = ?payload.customer_id,
        status = ?payload.status,
        "Subscription event received"
    );
}
