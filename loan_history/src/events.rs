use std::{collections::BTreeMap, fmt};

use alloy_primitives::{Address, U256};
use alloy_sol_types::sol;
use serde::{Serialize, Serializer};

sol! {
    interface INativeLoan {
        event Funded(uint256 amount, uint256 interestAmount, uint256 totalAmount);
        event LoanTaken(address indexed borrower, uint256 amount);
        event PartialRepayment(address indexed payer, uint256 amount);
        event FullyRepaid(address indexed payer, uint256 amount);
        event PenaltyApplied(uint256 penaltyAmount);

        function totalDue() external view returns (uint256);
        function dueDate() external view returns (uint256);
    }
}

/// A single decoded event argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgValue {
    Uint(U256),
    Address(Address),
    Bool(bool),
    Text(String),
}

impl Serialize for ArgValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ArgValue::Uint(v) => serializer.collect_str(v),
            ArgValue::Address(a) => serializer.collect_str(a),
            ArgValue::Bool(b) => serializer.serialize_bool(*b),
            ArgValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Named arguments of one event, keyed by ABI parameter name.
pub type EventArgs = BTreeMap<String, ArgValue>;

/// A ledger log as handed over by the event query collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawEvent {
    pub name: String,
    pub args: EventArgs,
    /// Address of the contract that emitted the log.
    pub address: Address,
    /// Seconds since epoch of the containing block.
    pub block_timestamp: u64,
}

impl RawEvent {
    pub fn new(name: impl Into<String>, address: Address, block_timestamp: u64) -> Self {
        Self {
            name: name.into(),
            args: EventArgs::new(),
            address,
            block_timestamp,
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.args.insert(name.into(), value);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LoanEventKind {
    Funded,
    LoanTaken,
    PartialRepayment,
    FullyRepaid,
    PenaltyApplied,
}

impl LoanEventKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Funded" => Some(Self::Funded),
            "LoanTaken" => Some(Self::LoanTaken),
            "PartialRepayment" => Some(Self::PartialRepayment),
            "FullyRepaid" => Some(Self::FullyRepaid),
            "PenaltyApplied" => Some(Self::PenaltyApplied),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Funded => "Funded",
            Self::LoanTaken => "LoanTaken",
            Self::PartialRepayment => "PartialRepayment",
            Self::FullyRepaid => "FullyRepaid",
            Self::PenaltyApplied => "PenaltyApplied",
        }
    }
}

impl fmt::Display for LoanEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A recognised event on a loan's timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoanEvent {
    #[serde(rename = "type")]
    pub kind: LoanEventKind,
    pub args: EventArgs,
    pub timestamp: u64,
}
