//! Inbound webhook pipeline: signature verification, typed events and dispatch.
//!
//! ```ignore
//! let verifier = WebhookVerifier::new("whsec_...")?;
//! let dispatcher = WebhookDispatcher::new();
//! dispatcher.on_subscription_canceled(|payload| async move {
//!     revoke_access(payload.customer_id).await
//! });
//!
//! let event = verifier.verify_headers(&body, &headers)?;
//! dispatcher.dispatch(event).await?;
//! ```

mod dispatcher;
mod errors;
mod event;
mod verifier;

pub use dispatcher::{HandlerFn, WebhookDispatcher, WebhookHandler};
pub use errors::{DispatchError, WebhookError};
pub use event::{
    EventType, PaymentFailedPayload, PaymentIntentPayload, SubscriptionPayload, UnknownEventType,
    WebhookEvent,
};
pub use verifier::{
    decode_signing_secret, WebhookHeaders, WebhookVerifier, DEFAULT_TOLERANCE, HEADER_ID,
    HEADER_SIGNATURE, HEADER_TIMESTAMP,
};
