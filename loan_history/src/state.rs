use alloy_primitives::Address;
use serde::Serialize;

use crate::{amount::Amount, events::LoanEvent};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum LoanStatus {
    #[default]
    Unknown,
    Funded,
    Taken,
    Repaid,
    Defaulted,
    Error,
}

/// Summary of one loan contract, rebuilt from scratch on every fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanState {
    pub contract_address: Address,
    pub events: Vec<LoanEvent>,
    pub status: LoanStatus,
    pub loan_amount: Amount,
    pub interest_amount: Amount,
    pub total_due: Amount,
    pub amount_repaid: Amount,
    /// Unix seconds, `None` when the live read was unavailable.
    pub due_date: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoanState {
    pub fn new(contract_address: Address) -> Self {
        Self {
            contract_address,
            events: Vec::new(),
            status: LoanStatus::Unknown,
            loan_amount: Amount::UNSET,
            interest_amount: Amount::UNSET,
            total_due: Amount::UNSET,
            amount_repaid: Amount::UNSET,
            due_date: None,
            error: None,
        }
    }

    /// The placeholder for a contract that could not be processed this cycle.
    pub fn failed(contract_address: Address, message: impl Into<String>) -> Self {
        Self {
            status: LoanStatus::Error,
            error: Some(message.into()),
            ..Self::new(contract_address)
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == LoanStatus::Error
    }
}
