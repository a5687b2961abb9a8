//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup into an explicit `Config`
//! struct that gets injected into the handler state. Secrets are never
//! literals in code; missing required variables abort startup.

use std::env;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Stripe API secret key (for outbound Stripe calls)
    pub stripe_secret_key: String,

    /// Stripe webhook signing secret (`whsec_...`) used for verification
    pub stripe_webhook_secret: String,

    /// MongoDB connection string for the user store
    pub mongodb_url: String,

    /// MongoDB database holding the users collection
    pub mongodb_database: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Maximum age in seconds for Stripe webhook timestamps
    pub stripe_signature_max_age: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails fast with a descriptive error if any required variable is
    /// absent or blank.
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            stripe_secret_key: require("STRIPE_SECRET_KEY")?,

            stripe_webhook_secret: require("STRIPE_WEBHOOK_SECRET")?,

            mongodb_url: require("MONGODB_URL")?,

            mongodb_database: env::var("MONGODB_DATABASE")
                .unwrap_or_else(|_| "entitlements".to_string()),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            stripe_signature_max_age: env::var("STRIPE_SIGNATURE_MAX_AGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300), // 5 minutes default
        })
    }
}

/// Read a required environment variable, rejecting blank values.
fn require(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("{} must be set", name))?;
    if value.trim().is_empty() {
        bail!("{} must not be blank", name);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_present() {
        env::set_var("TEST_REQUIRE_PRESENT", "whsec_abc123");
        let result = require("TEST_REQUIRE_PRESENT");
        assert_eq!(result.unwrap(), "whsec_abc123");
        env::remove_var("TEST_REQUIRE_PRESENT");
    }

    #[test]
    fn test_require_missing() {
        let result = require("TEST_REQUIRE_MISSING_NONEXISTENT");
        assert!(result.is_err());
    }

    #[test]
    fn test_require_blank() {
        env::set_var("TEST_REQUIRE_BLANK", "   ");
        let result = require("TEST_REQUIRE_BLANK");
        assert!(result.is_err());
        env::remove_var("TEST_REQUIRE_BLANK");
    }
}
