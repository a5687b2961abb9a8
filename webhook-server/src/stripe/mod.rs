//! Stripe webhook verification and event parsing.
//!
//! This module owns the inbound Stripe contract:
//! - HMAC-SHA256 signature verification over the raw body
//! - Typed parsing of the event envelope after verification

pub mod event;
pub mod signature;

use thiserror::Error;

pub use event::{CheckoutSession, Dispatch, EventData, StripeEvent, CHECKOUT_SESSION_COMPLETED};
pub use signature::{verify_signature, SignatureError};

/// Why a webhook request could not be turned into a verified event.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("{0}")]
    Signature(#[from] SignatureError),
    #[error("failed to parse event envelope: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Verify a webhook request and parse its event envelope.
///
/// `payload` must be the exact raw body bytes of the request; the
/// signature covers them byte for byte, so nothing may parse or
/// re-serialize the body before this call.
pub fn construct_event(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    max_age_seconds: u64,
) -> Result<StripeEvent, WebhookError> {
    verify_signature(secret, signature_header, payload, max_age_seconds)?;
    Ok(StripeEvent::parse(payload)?)
}
