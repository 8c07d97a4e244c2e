//! Stripe Webhook Handling
//!
//! Verifies the `Stripe-Signature` header and extracts the payment reference
//! from `checkout.session.completed` events.
//!
//! Signature scheme: the header carries `t=<unix seconds>` and a
//! `v1=<hex>` entry, an HMAC-SHA256 of `"<t>.<raw body>"` keyed with the
//! endpoint secret. Payloads older than five minutes are rejected.

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use stripe::{Event, EventObject, EventType, Webhook, WebhookError};

use crate::error::{PaymentError, Result};
use crate::model::Reference;

/// Header Stripe sends the signature in
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum age of a signed payload, in seconds
const TOLERANCE_SECS: u64 = 300;

/// Parsed webhook event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WebhookEvent {
    /// Checkout completed for a payment reference
    CheckoutCompleted { reference: Reference },

    /// Checkout completed but carried no reference metadata
    CheckoutWithoutReference { session_id: String },

    /// Unhandled event type
    Other { event_type: String },
}

impl From<Event> for WebhookEvent {
    fn from(event: Event) -> Self {
        match (event.type_, event.data.object) {
            (EventType::CheckoutSessionCompleted, EventObject::CheckoutSession(session)) => {
                let reference = session
                    .metadata
                    .and_then(|mut metadata| metadata.remove("reference"))
                    .filter(|reference| !reference.is_empty());

                match reference {
                    Some(reference) => Self::CheckoutCompleted {
                        reference: Reference::from_string(reference),
                    },
                    None => Self::CheckoutWithoutReference {
                        session_id: session.id.as_str().to_string(),
                    },
                }
            }
            (event_type, _) => Self::Other {
                event_type: event_type.to_string(),
            },
        }
    }
}

fn webhook_error(err: WebhookError) -> PaymentError {
    match err {
        WebhookError::BadParse(e) => PaymentError::WebhookParse(e.to_string()),
        other => PaymentError::Signature(other.to_string()),
    }
}

/// Reject timestamps outside the tolerance before the HMAC runs
///
/// Stripe's own check subtracts the raw header value, which overflows for
/// extreme `t=` values. The lookup matches Stripe's: untrimmed keys, last
/// `t` wins.
fn check_timestamp(signature: &str, now: i64) -> Result<()> {
    let timestamp = signature
        .split(',')
        .filter_map(|part| {
            let mut pair = part.split('=');
            match (pair.next(), pair.next()) {
                (Some("t"), Some(value)) => Some(value),
                _ => None,
            }
        })
        .last()
        .and_then(|value| value.parse::<i64>().ok())
        .ok_or_else(|| PaymentError::Signature("Missing or invalid timestamp".into()))?;

    if now.abs_diff(timestamp) > TOLERANCE_SECS {
        return Err(PaymentError::Signature(
            "Timestamp outside the tolerance zone".into(),
        ));
    }
    Ok(())
}

/// Webhook signature verifier
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verify signature and parse event
    pub fn construct_event(&self, payload: &str, signature: &str) -> Result<WebhookEvent> {
        check_timestamp(signature, Utc::now().timestamp())?;
        Webhook::construct_event(payload, signature, &self.secret)
            .map(WebhookEvent::from)
            .map_err(webhook_error)
    }

    /// Verify against a fixed clock, for replaying recorded deliveries
    pub fn construct_event_at(
        &self,
        payload: &str,
        signature: &str,
        now: i64,
    ) -> Result<WebhookEvent> {
        check_timestamp(signature, now)?;
        Webhook::construct_event_with_timestamp(payload, signature, &self.secret, now)
            .map(WebhookEvent::from)
            .map_err(webhook_error)
    }
}

/// Build a `Stripe-Signature` header value for `payload`
///
/// Used by tests and local tooling that replays events.
pub fn sign_payload(secret: &str, payload: &str, timestamp: i64) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Config(e.to_string()))?;
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    Ok(format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}
