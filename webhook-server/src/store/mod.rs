//! Persistence module for user entitlement records.

pub mod users;

pub use users::UserStore;
