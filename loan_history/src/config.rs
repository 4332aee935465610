use std::{path::PathBuf, time::Duration};

use eyre::{eyre, WrapErr};

use crate::reducer::FoldOrder;

pub const DEFAULT_REGISTRY: &str = "loan_registry.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// JSON-RPC endpoint; without it fetches return nothing.
    pub rpc_url: Option<String>,
    pub registry_path: PathBuf,
    pub fold_order: FoldOrder,
    pub call_timeout: Option<Duration>,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> eyre::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let fold_order = match get("LOAN_HISTORY_FOLD_ORDER") {
            Some(v) => v.parse().map_err(|e: String| eyre!(e))?,
            None => FoldOrder::default(),
        };
        let call_timeout = match get("LOAN_HISTORY_CALL_TIMEOUT_SECS") {
            Some(v) => Some(Duration::from_secs(
                v.trim()
                    .parse()
                    .wrap_err("LOAN_HISTORY_CALL_TIMEOUT_SECS must be whole seconds")?,
            )),
            None => None,
        };

        Ok(Self {
            rpc_url: get("LOAN_HISTORY_RPC_URL"),
            registry_path: get("LOAN_HISTORY_REGISTRY")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRY)),
            fold_order,
            call_timeout,
        })
    }
}
