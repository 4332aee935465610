#![cfg(test)]

use crate::generation::{FetchGeneration, LoanBoard};
use crate::history::{HistoryError, LoanHistory};
use crate::registry::{AddressRegistry, MemoryRegistry};
use crate::state::{LoanState, LoanStatus};
use crate::test_helpers::*;

#[test]
fn test_tickets_increase() {
    let generation = FetchGeneration::new();
    let first = generation.begin();
    let second = generation.begin();

    assert!(second > first);
    assert!(!generation.is_current(first));
    assert!(generation.is_current(second));
}

#[test]
fn test_stale_result_is_discarded() {
    let board = LoanBoard::new();
    let slow = board.begin_fetch();
    let fast = board.begin_fetch();

    assert!(board.apply(fast, Ok(vec![LoanState::new(loan_b())])));
    assert!(!board.apply(slow, Ok(vec![LoanState::new(loan_a())])));

    let view = board.snapshot();
    assert!(!view.loading);
    assert_eq!(view.loans.len(), 1);
    assert_eq!(view.loans[0].contract_address, loan_b());
}

#[test]
fn test_stale_result_does_not_clear_loading() {
    let board = LoanBoard::new();
    let old = board.begin_fetch();
    let _current = board.begin_fetch();

    assert!(!board.apply(old, Ok(Vec::new())));
    assert!(board.snapshot().loading);
}

#[test]
fn test_batch_error_is_shown() {
    let board = LoanBoard::new();
    let ticket = board.begin_fetch();

    assert!(board.apply(ticket, Err(HistoryError::Registry("unreadable".to_string()))));

    let view = board.snapshot();
    assert!(view.loans.is_empty());
    assert!(view.error.unwrap().contains("unreadable"));
}

#[tokio::test]
async fn test_refresh_publishes_latest_fetch() {
    let registry = MemoryRegistry::new();
    registry.append(wallet(), loan_a()).unwrap();
    let ledger = FakeLedger::default().with_events(loan_a(), vec![standard_funding(loan_a(), 1)]);
    let history = LoanHistory::new(Some(ledger), registry);
    let board = LoanBoard::new();

    assert!(history.refresh(&board, Some(wallet())).await);
    assert_eq!(board.snapshot().loans[0].status, LoanStatus::Funded);

    // logging out replaces the list with nothing
    assert!(history.refresh(&board, None).await);
    assert!(board.snapshot().loans.is_empty());
}
