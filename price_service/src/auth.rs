//! Admin authorization for price updates.

use alloy_primitives::{keccak256, Address, B256};

/// Who is asking, as presented in the request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminIdentity {
    pub token: Option<String>,
    pub wallet: Option<Address>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

pub trait Authorizer: Send + Sync {
    fn authorize(&self, identity: &AdminIdentity) -> Decision;
}

/// Source of the shared admin secret.
pub trait SecretStore {
    fn admin_secret(&self) -> Option<String>;
}

/// Reads the secret from an environment variable.
#[derive(Clone, Debug)]
pub struct EnvSecretStore {
    var: String,
}

impl EnvSecretStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl SecretStore for EnvSecretStore {
    fn admin_secret(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|s| !s.is_empty())
    }
}

/// Fixed secret, mostly for tests and embedding.
#[derive(Clone, Debug)]
pub struct StaticSecret(pub String);

impl SecretStore for StaticSecret {
    fn admin_secret(&self) -> Option<String> {
        Some(self.0.clone()).filter(|s| !s.is_empty())
    }
}

/// Requires the shared secret and, when configured, a listed admin wallet.
///
/// Only the digest of the secret is kept in memory.
#[derive(Clone, Debug)]
pub struct AdminPolicy {
    secret_digest: Option<B256>,
    admin_wallets: Vec<Address>,
}

impl AdminPolicy {
    pub fn new(secrets: &dyn SecretStore, admin_wallets: Vec<Address>) -> Self {
        Self {
            secret_digest: secrets.admin_secret().map(|s| keccak256(s.as_bytes())),
            admin_wallets,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_digest.is_some()
    }
}

impl Authorizer for AdminPolicy {
    fn authorize(&self, identity: &AdminIdentity) -> Decision {
        let Some(expected) = self.secret_digest else {
            return Decision::Deny("admin access is not configured");
        };
        let Some(token) = identity.token.as_deref() else {
            return Decision::Deny("missing admin token");
        };
        if keccak256(token.as_bytes()) != expected {
            return Decision::Deny("invalid admin token");
        }
        if !self.admin_wallets.is_empty() {
            match identity.wallet {
                Some(wallet) if self.admin_wallets.contains(&wallet) => {}
                _ => return Decision::Deny("wallet is not an administrator"),
            }
        }
        Decision::Allow
    }
}
