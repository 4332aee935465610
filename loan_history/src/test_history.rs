#![cfg(test)]

use std::time::Duration;

use alloy_primitives::U256;
use eyre::eyre;

use crate::history::{HistoryError, LoanHistory};
use crate::reducer::FoldOrder;
use crate::registry::{AddressRegistry, MemoryRegistry};
use crate::state::LoanStatus;
use crate::test_helpers::*;

fn registry_with(contracts: &[alloy_primitives::Address]) -> MemoryRegistry {
    let registry = MemoryRegistry::new();
    for c in contracts {
        registry.append(wallet(), *c).unwrap();
    }
    registry
}

struct BrokenRegistry;

impl AddressRegistry for BrokenRegistry {
    fn addresses(&self, _identity: alloy_primitives::Address) -> eyre::Result<Vec<alloy_primitives::Address>> {
        Err(eyre!("registry file is corrupt"))
    }

    fn append(&self, _identity: alloy_primitives::Address, _contract: alloy_primitives::Address) -> eyre::Result<bool> {
        Err(eyre!("registry file is corrupt"))
    }
}

#[tokio::test]
async fn test_failing_contract_does_not_abort_batch() {
    let ledger = FakeLedger::default()
        .with_events(loan_a(), vec![standard_funding(loan_a(), 100), taken(loan_a(), 200)])
        .with_reads(loan_a(), milli(1100), 1_700_000_000)
        .failing(loan_b(), "connection refused");
    let history = LoanHistory::new(Some(ledger), registry_with(&[loan_a(), loan_b()]));

    let loans = history.fetch(Some(wallet())).await.unwrap();

    assert_eq!(loans.len(), 2);
    assert_eq!(loans[0].contract_address, loan_a());
    assert_eq!(loans[0].status, LoanStatus::Taken);
    assert_eq!(loans[0].total_due.to_string(), "1.1");
    assert_eq!(loans[0].due_date, Some(1_700_000_000));
    assert_eq!(loans[0].events.len(), 2);

    assert_eq!(loans[1].contract_address, loan_b());
    assert_eq!(loans[1].status, LoanStatus::Error);
    assert!(loans[1].events.is_empty());
    assert!(loans[1].error.as_deref().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_failure_first_keeps_later_contract_intact() {
    let ledger = FakeLedger::default()
        .failing(loan_a(), "boom")
        .with_events(loan_b(), vec![standard_funding(loan_b(), 10)]);
    let history = LoanHistory::new(Some(ledger), registry_with(&[loan_a(), loan_b()]));

    let loans = history.fetch(Some(wallet())).await.unwrap();

    assert_eq!(loans[0].status, LoanStatus::Error);
    assert_eq!(loans[1].status, LoanStatus::Funded);
    assert_eq!(loans[1].loan_amount.to_string(), "1.0");
}

#[tokio::test]
async fn test_live_total_due_supersedes_events() {
    let ledger = FakeLedger::default()
        .with_events(loan_a(), vec![standard_funding(loan_a(), 100), penalty(loan_a(), 200)])
        .with_reads(loan_a(), milli(1210), 1_800_000_000);
    let history = LoanHistory::new(Some(ledger), registry_with(&[loan_a()]));

    let loans = history.fetch(Some(wallet())).await.unwrap();

    assert_eq!(loans[0].status, LoanStatus::Defaulted);
    assert_eq!(loans[0].total_due.to_string(), "1.21");
}

#[tokio::test]
async fn test_failed_live_reads_fall_back_to_events() {
    let ledger = FakeLedger::default().with_events(loan_a(), vec![standard_funding(loan_a(), 100)]);
    let history = LoanHistory::new(Some(ledger), registry_with(&[loan_a()]));

    let loans = history.fetch(Some(wallet())).await.unwrap();

    assert_eq!(loans[0].status, LoanStatus::Funded);
    assert_eq!(loans[0].total_due.to_string(), "1.1");
    assert_eq!(loans[0].due_date, None);
    assert_eq!(loans[0].error, None);
}

#[tokio::test]
async fn test_malformed_event_marks_contract_as_error() {
    let broken = crate::events::RawEvent::new("Funded", loan_a(), 1);
    let ledger = FakeLedger::default()
        .with_events(loan_a(), vec![broken])
        .with_events(loan_b(), vec![standard_funding(loan_b(), 1)]);
    let history = LoanHistory::new(Some(ledger), registry_with(&[loan_a(), loan_b()]));

    let loans = history.fetch(Some(wallet())).await.unwrap();

    assert_eq!(loans[0].status, LoanStatus::Error);
    assert!(loans[0].error.as_deref().unwrap().contains("amount"));
    assert_eq!(loans[1].status, LoanStatus::Funded);
}

#[tokio::test]
async fn test_no_identity_yields_empty_result() {
    let ledger = FakeLedger::default().with_events(loan_a(), vec![standard_funding(loan_a(), 1)]);
    let history = LoanHistory::new(Some(ledger), registry_with(&[loan_a()]));

    assert!(history.fetch(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_no_ledger_yields_empty_result() {
    let history: LoanHistory<FakeLedger, _> = LoanHistory::new(None, registry_with(&[loan_a()]));

    assert!(history.fetch(Some(wallet())).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unregistered_identity_yields_empty_result() {
    let history = LoanHistory::new(Some(FakeLedger::default()), MemoryRegistry::new());

    assert!(history.fetch(Some(wallet())).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_registry_failure_is_a_batch_error() {
    let history = LoanHistory::new(Some(FakeLedger::default()), BrokenRegistry);

    let err = history.fetch(Some(wallet())).await.unwrap_err();
    assert!(matches!(err, HistoryError::Registry(_)));
}

#[tokio::test]
async fn test_input_address_order_preserved() {
    let ledger = FakeLedger::default()
        .with_events(loan_a(), vec![standard_funding(loan_a(), 1)])
        .with_events(loan_b(), vec![standard_funding(loan_b(), 1)]);
    let history = LoanHistory::new(Some(ledger), registry_with(&[loan_b(), loan_a()]));

    let loans = history.fetch(Some(wallet())).await.unwrap();
    let order: Vec<_> = loans.iter().map(|l| l.contract_address).collect();
    assert_eq!(order, vec![loan_b(), loan_a()]);
}

#[tokio::test]
async fn test_fold_order_is_configurable() {
    let events = vec![standard_funding(loan_a(), 100), penalty(loan_a(), 500), repaid(loan_a(), 300)];
    let ledger = FakeLedger::default().with_events(loan_a(), events);
    let history = LoanHistory::new(Some(ledger), registry_with(&[loan_a()]))
        .with_fold_order(FoldOrder::Chronological);

    let loans = history.fetch(Some(wallet())).await.unwrap();
    assert_eq!(loans[0].status, LoanStatus::Defaulted);
}

#[tokio::test]
async fn test_hung_event_query_times_out_into_error() {
    let ledger = FakeLedger::default()
        .hanging(loan_a())
        .with_events(loan_b(), vec![standard_funding(loan_b(), 1)])
        .with_reads(loan_b(), U256::from(5u64), 42);
    let history = LoanHistory::new(Some(ledger), registry_with(&[loan_a(), loan_b()]))
        .with_call_timeout(Some(Duration::from_millis(20)));

    let loans = history.fetch(Some(wallet())).await.unwrap();

    assert_eq!(loans[0].status, LoanStatus::Error);
    assert!(loans[0].error.as_deref().unwrap().contains("timed out"));
    assert_eq!(loans[1].status, LoanStatus::Funded);
    assert_eq!(loans[1].due_date, Some(42));
}

struct FixedRegistry(Vec<alloy_primitives::Address>);

impl AddressRegistry for FixedRegistry {
    fn addresses(&self, _identity: alloy_primitives::Address) -> eyre::Result<Vec<alloy_primitives::Address>> {
        Ok(self.0.clone())
    }

    fn append(&self, _identity: alloy_primitives::Address, _contract: alloy_primitives::Address) -> eyre::Result<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn test_duplicate_addresses_fetched_once() {
    let ledger = FakeLedger::default()
        .with_events(loan_a(), vec![standard_funding(loan_a(), 1)])
        .with_events(loan_b(), vec![taken(loan_b(), 1)]);
    let history = LoanHistory::new(
        Some(ledger),
        FixedRegistry(vec![loan_a(), loan_b(), loan_a()]),
    );

    let loans = history.fetch(Some(wallet())).await.unwrap();
    assert_eq!(loans.len(), 2);
    assert_eq!(loans[0].contract_address, loan_a());
    assert_eq!(loans[1].status, LoanStatus::Taken);
}
