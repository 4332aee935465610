//! Reference crypto prices for the loan request flow.
//!
//! Anyone may read the prices; updates need an admin per [`auth::AdminPolicy`].

pub mod api;
pub mod auth;
pub mod config;
pub mod store;

pub use api::{router, AppState};
pub use auth::{AdminIdentity, AdminPolicy, Authorizer, Decision, EnvSecretStore, SecretStore, StaticSecret};
pub use store::{InMemoryPriceStore, PriceEntry, PriceError, PriceRepository};
