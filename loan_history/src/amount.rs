use std::fmt;

use alloy_primitives::U256;
use serde::{Serialize, Serializer};

/// Fixed-point decimals of the native currency amounts.
pub const DECIMALS: u8 = 18;

/// Places kept when accumulating partial repayments.
pub const REPAID_PLACES: u8 = 4;

/// A currency amount held in base units.
///
/// Displays like an ether value: `0.0`, `1.0`, `0.1`, `1.1`. An amount no
/// event has set yet renders as `0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Amount(Option<U256>);

impl Amount {
    pub const UNSET: Self = Self(None);

    pub fn from_base_units(units: U256) -> Self {
        Self(Some(units))
    }

    /// Base units, zero when unset.
    fn base_units(&self) -> U256 {
        self.0.unwrap_or_default()
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(Some(self.base_units().saturating_add(other.base_units())))
    }

    /// Rounds half-up to `places` decimals.
    pub fn rounded(self, places: u8) -> Self {
        let Some(units) = self.0 else {
            return self;
        };
        if places >= DECIMALS {
            return self;
        }
        let unit = _pow10(DECIMALS - places);
        let rem = units % unit;
        let floor = units - rem;
        if rem.saturating_mul(U256::from(2u64)) >= unit {
            Self(Some(floor.saturating_add(unit)))
        } else {
            Self(Some(floor))
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(units) = self.0 else {
            return f.write_str("0");
        };
        let scale = _pow10(DECIMALS);
        let whole = units / scale;
        let frac = (units % scale).to_string();
        let padded = format!("{:0>width$}", frac, width = DECIMALS as usize);
        let trimmed = padded.trim_end_matches('0');
        if trimmed.is_empty() {
            write!(f, "{whole}.0")
        } else {
            write!(f, "{whole}.{trimmed}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn _pow10(exp: u8) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}
