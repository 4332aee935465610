//! Folds ledger events of one loan contract into a [`LoanState`].

use std::{fmt, str::FromStr};

use alloy_primitives::{Address, U256};

use crate::{
    amount::{Amount, REPAID_PLACES},
    events::{ArgValue, EventArgs, LoanEvent, LoanEventKind, RawEvent},
    state::{LoanState, LoanStatus},
};

/// Order in which records are folded into the status.
///
/// `Input` folds in the order the ledger returned them, so the last recognised
/// record wins regardless of its timestamp. `Chronological` stably sorts by
/// block timestamp first. The timeline is sorted either way.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FoldOrder {
    #[default]
    Input,
    Chronological,
}

impl FromStr for FoldOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input" => Ok(Self::Input),
            "chronological" => Ok(Self::Chronological),
            other => Err(format!("unknown fold order `{other}`")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReduceError {
    MissingArgument {
        event: LoanEventKind,
        name: &'static str,
    },
    WrongArgumentType {
        event: LoanEventKind,
        name: &'static str,
    },
}

impl fmt::Display for ReduceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArgument { event, name } => {
                write!(f, "{event} event is missing argument `{name}`")
            }
            Self::WrongArgumentType { event, name } => {
                write!(f, "{event} event argument `{name}` is not an unsigned integer")
            }
        }
    }
}

impl std::error::Error for ReduceError {}

/// Replays `raw` into the state of `contract`.
///
/// Records emitted by another address and records with an unrecognised name
/// are skipped entirely.
pub fn reduce(
    contract: Address,
    raw: &[RawEvent],
    order: FoldOrder,
) -> Result<LoanState, ReduceError> {
    let mut folded: Vec<&RawEvent> = raw.iter().filter(|r| r.address == contract).collect();
    if order == FoldOrder::Chronological {
        folded.sort_by_key(|r| r.block_timestamp);
    }

    let mut state = LoanState::new(contract);
    for record in folded {
        let Some(kind) = LoanEventKind::from_name(&record.name) else {
            continue;
        };
        _apply(&mut state, kind, &record.args)?;
        state.events.push(LoanEvent {
            kind,
            args: record.args.clone(),
            timestamp: record.block_timestamp,
        });
    }

    state.events.sort_by_key(|e| e.timestamp);
    Ok(state)
}

/// Overwrites event-derived values with the contract's live reads.
///
/// A missing read leaves the corresponding field as it was, except `due_date`
/// which has no event-derived value and stays `None`.
pub fn enrich(mut state: LoanState, total_due: Option<U256>, due_date: Option<U256>) -> LoanState {
    if let Some(total) = total_due {
        state.total_due = Amount::from_base_units(total);
    }
    state.due_date = due_date.and_then(|d| u64::try_from(d).ok());
    state
}

fn _apply(state: &mut LoanState, kind: LoanEventKind, args: &EventArgs) -> Result<(), ReduceError> {
    match kind {
        LoanEventKind::Funded => {
            state.status = LoanStatus::Funded;
            state.loan_amount = _amount(args, kind, "amount")?;
            state.interest_amount = _amount(args, kind, "interestAmount")?;
            state.total_due = _amount(args, kind, "totalAmount")?;
        }
        LoanEventKind::LoanTaken => state.status = LoanStatus::Taken,
        LoanEventKind::PartialRepayment => {
            let paid = _amount(args, kind, "amount")?;
            state.amount_repaid = state.amount_repaid.saturating_add(paid).rounded(REPAID_PLACES);
        }
        LoanEventKind::FullyRepaid => {
            state.status = LoanStatus::Repaid;
            state.amount_repaid = state.total_due;
        }
        LoanEventKind::PenaltyApplied => state.status = LoanStatus::Defaulted,
    }
    Ok(())
}

fn _amount(args: &EventArgs, event: LoanEventKind, name: &'static str) -> Result<Amount, ReduceError> {
    match args.get(name) {
        Some(ArgValue::Uint(v)) => Ok(Amount::from_base_units(*v)),
        Some(_) => Err(ReduceError::WrongArgumentType { event, name }),
        None => Err(ReduceError::MissingArgument { event, name }),
    }
}
