//! Stripe checkout entitlement webhook service.
//!
//! This library backs the `entitlements-web` binary: a thin web server that
//! receives Stripe webhook callbacks, verifies their signatures, and grants
//! a `pro` entitlement in the user store when a checkout completes.
//!
//! ## Architecture
//!
//! ```text
//! Stripe → Web Server → signature verification → dispatch → user store upsert
//! ```

pub mod config;
pub mod store;
pub mod stripe;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use store::UserStore;
pub use stripe::{construct_event, SignatureError, StripeEvent, WebhookError};
pub use web::AppState;
