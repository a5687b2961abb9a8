//! Web server module for handling inbound webhooks.
//!
//! This module provides a thin web server that:
//! - Receives Stripe webhook callbacks
//! - Verifies their signatures against the signing secret
//! - Grants the pro entitlement on completed checkouts
//! - Acknowledges every verified event with 200

pub mod handlers;

pub use handlers::{health, stripe_webhook, AppState, HealthResponse};
