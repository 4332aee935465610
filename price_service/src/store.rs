use std::{
    collections::BTreeMap,
    fmt,
    sync::{PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference price of one symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub value: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PriceError {
    UnknownSymbol(String),
    InvalidValue,
}

impl fmt::Display for PriceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSymbol(symbol) => write!(f, "unknown symbol {symbol}"),
            Self::InvalidValue => f.write_str("value must be a positive number"),
        }
    }
}

impl std::error::Error for PriceError {}

pub trait PriceRepository: Send + Sync {
    fn all(&self) -> BTreeMap<String, PriceEntry>;

    fn get(&self, symbol: &str) -> Option<PriceEntry>;

    /// Replaces the price of an existing symbol; never adds a new one.
    fn update(&self, symbol: &str, value: f64, at: DateTime<Utc>) -> Result<PriceEntry, PriceError>;
}

/// Symbols the store starts with.
pub const DEFAULT_PRICES: [(&str, f64); 5] = [
    ("ETH", 2000.0),
    ("USDT", 1.0),
    ("DAI", 1.0),
    ("USDC", 1.0),
    ("DEV", 0.1),
];

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryPriceStore {
    prices: RwLock<BTreeMap<String, PriceEntry>>,
}

impl InMemoryPriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(at: DateTime<Utc>) -> Self {
        Self::with_prices(DEFAULT_PRICES, at)
    }

    pub fn with_prices<'a>(prices: impl IntoIterator<Item = (&'a str, f64)>, at: DateTime<Utc>) -> Self {
        let prices = prices
            .into_iter()
            .map(|(symbol, value)| (symbol.to_string(), PriceEntry { value, last_updated: at }))
            .collect();
        Self {
            prices: RwLock::new(prices),
        }
    }
}

impl PriceRepository for InMemoryPriceStore {
    fn all(&self) -> BTreeMap<String, PriceEntry> {
        self.prices.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn get(&self, symbol: &str) -> Option<PriceEntry> {
        self.prices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
            .cloned()
    }

    fn update(&self, symbol: &str, value: f64, at: DateTime<Utc>) -> Result<PriceEntry, PriceError> {
        let mut prices = self.prices.write().unwrap_or_else(PoisonError::into_inner);
        let entry = prices
            .get_mut(symbol)
            .ok_or_else(|| PriceError::UnknownSymbol(symbol.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(PriceError::InvalidValue);
        }
        *entry = PriceEntry {
            value,
            last_updated: at,
        };
        Ok(entry.clone())
    }
}
