//! Stripe event envelope types and dispatch.
//!
//! Events arrive as a tagged envelope: a `type` string and a `data.object`
//! payload whose shape depends on the type. Only `checkout.session.completed`
//! is acted on; everything else deserializes fine and is acknowledged as a
//! no-op so Stripe does not redeliver it.

use serde::Deserialize;
use serde_json::Value;

/// The one event type this service acts on.
pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

/// A verified Stripe event envelope.
#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    /// Stripe event id (`evt_...`)
    #[serde(default)]
    pub id: String,
    /// Event type discriminant, e.g. `checkout.session.completed`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Type-dependent payload
    pub data: EventData,
}

/// The `data` member of the envelope.
#[derive(Debug, Deserialize)]
pub struct EventData {
    /// The object the event describes; shape depends on the event type
    pub object: Value,
}

/// The fields of a checkout session this service cares about.
#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    /// Customer email, if Stripe had one for this checkout
    #[serde(default)]
    pub customer_email: Option<String>,
}

/// What the handler should do with a verified event.
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Completed checkout with a usable email: grant the entitlement
    GrantPro(String),
    /// Completed checkout but no email to key the user record by
    MissingEmail,
    /// Any other event type: acknowledge without acting
    Unhandled,
}

impl StripeEvent {
    /// Parse an envelope from verified raw body bytes.
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Classify this event into the action the handler should take.
    ///
    /// Checkout sessions whose `customer_email` is absent or empty fall
    /// into `MissingEmail`: likely a checkout mode this service does not
    /// support yet, so the handler logs it distinctly from `Unhandled`.
    pub fn dispatch(&self) -> Dispatch {
        if self.event_type != CHECKOUT_SESSION_COMPLETED {
            return Dispatch::Unhandled;
        }

        let session: CheckoutSession = match serde_json::from_value(self.data.object.clone()) {
            Ok(s) => s,
            Err(_) => return Dispatch::MissingEmail,
        };

        match session.customer_email {
            Some(email) if !email.trim().is_empty() => Dispatch::GrantPro(email),
            _ => Dispatch::MissingEmail,
        }
    }
}
