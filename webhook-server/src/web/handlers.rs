//! Webhook endpoint handlers.
//!
//! The Stripe handler does exactly three things:
//! 1. Verify the signature over the raw body
//! 2. Dispatch the one event type that matters to a store upsert
//! 3. Acknowledge with 200 so Stripe stops redelivering
//!
//! Every verified event gets a 200, even the ones this service ignores;
//! a non-2xx would make Stripe retry events we never act on. The only
//! 5xx is a failed store write, where a retry is exactly what we want.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::store::UserStore;
use crate::stripe::{construct_event, Dispatch, SignatureError};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: UserStore,
}

impl AppState {
    pub fn new(config: Config, store: UserStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Stripe Webhook
// =============================================================================

/// Stripe webhook endpoint.
///
/// The body is extracted as raw `Bytes` on purpose: the signature covers
/// the exact bytes Stripe sent, so no JSON extractor may run before
/// verification.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    info!(
        body_length = body.len(),
        has_signature = headers.contains_key("Stripe-Signature"),
        "stripe_webhook_received"
    );

    let signature = match headers.get("Stripe-Signature").and_then(|v| v.to_str().ok()) {
        Some(s) => s,
        None => {
            warn!("stripe_signature_header_missing");
            return webhook_error(&SignatureError::MissingHeader.to_string());
        }
    };

    let event = match construct_event(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        state.config.stripe_signature_max_age,
    ) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "stripe_webhook_rejected");
            return webhook_error(&e.to_string());
        }
    };

    match event.dispatch() {
        Dispatch::GrantPro(email) => {
            if let Err(e) = state.store.grant_pro(&email).await {
                // Surfacing a 5xx here makes Stripe redeliver; the grant is
                // a merge-upsert, so the retry converges on the same state.
                error!(error = %e, event_id = %event.id, "store_write_failed");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store write failed".to_string(),
                );
            }
            info!(event_id = %event.id, email = %email, "entitlement_granted");
        }
        Dispatch::MissingEmail => {
            warn!(event_id = %event.id, "checkout_missing_customer_email");
        }
        Dispatch::Unhandled => {
            info!(
                event_id = %event.id,
                event_type = %event.event_type,
                "event_unhandled"
            );
        }
    }

    (StatusCode::OK, "Received webhook".to_string())
}

/// 400 response for an unverifiable or unparseable webhook request.
fn webhook_error(reason: &str) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, format!("Webhook Error: {}", reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_error_body() {
        let (status, body) = webhook_error("no signatures found matching the expected signature for payload");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("Webhook Error: "));
    }
}
