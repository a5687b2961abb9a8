//! User document store backed by MongoDB.
//!
//! One collection, `users`, keyed by email address. The only write this
//! service performs is the entitlement grant: a merge-upsert that sets
//! `pro: true` and leaves every other field on the document alone.
//!
//! Email as the primary key is inherited from the checkout flow and is
//! fragile: a customer who checks out under a new address gets a second
//! record. See DESIGN.md before building anything else on this key.

use anyhow::{Context, Result};
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, UpdateOptions};
use mongodb::{Client, Collection};
use tracing::info;

use crate::Config;

const USERS_COLLECTION: &str = "users";

/// Long-lived handle to the users collection.
///
/// Constructed once at startup and cloned into the handler state; the
/// underlying `mongodb::Client` pools connections internally.
#[derive(Clone)]
pub struct UserStore {
    users: Collection<Document>,
}

impl UserStore {
    /// Connect to MongoDB and resolve the users collection.
    pub async fn connect(config: &Config) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.mongodb_url)
            .await
            .context("Failed to parse MongoDB connection string")?;
        options.app_name = Some("entitlements-webhook".to_string());

        let client =
            Client::with_options(options).context("Failed to create MongoDB client")?;
        let users = client
            .database(&config.mongodb_database)
            .collection::<Document>(USERS_COLLECTION);

        info!(
            database = %config.mongodb_database,
            collection = USERS_COLLECTION,
            "user_store_connected"
        );

        Ok(Self { users })
    }

    /// Grant the `pro` entitlement to the user keyed by `email`.
    ///
    /// Merge-upsert: creates the document if absent, otherwise touches only
    /// the `pro` field. Redelivering the same event lands in the same end
    /// state, so provider-side retries are safe.
    pub async fn grant_pro(&self, email: &str) -> Result<()> {
        let options = UpdateOptions::builder().upsert(true).build();

        self.users
            .update_one(doc! { "_id": email }, grant_update(), options)
            .await
            .with_context(|| format!("Failed to upsert pro entitlement for {}", email))?;

        Ok(())
    }
}

/// The update document for an entitlement grant.
fn grant_update() -> Document {
    doc! { "$set": { "pro": true } }
}
