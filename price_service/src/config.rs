use alloy_primitives::Address;
use eyre::WrapErr;

pub const DEFAULT_PORT: u16 = 3001;
pub const SECRET_VAR: &str = "PRICE_ADMIN_SECRET";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    /// Empty means any holder of the secret is an admin.
    pub admin_wallets: Vec<Address>,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let port = match lookup("PORT").filter(|v| !v.trim().is_empty()) {
            Some(v) => v.trim().parse().wrap_err("PORT must be a port number")?,
            None => DEFAULT_PORT,
        };

        let mut admin_wallets = Vec::new();
        for raw in lookup("PRICE_ADMIN_WALLETS").unwrap_or_default().split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            admin_wallets.push(
                raw.parse::<Address>()
                    .wrap_err_with(|| format!("PRICE_ADMIN_WALLETS: `{raw}` is not an address"))?,
            );
        }

        Ok(Self { port, admin_wallets })
    }
}
