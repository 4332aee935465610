use std::{fmt, future::Future, time::Duration};

use alloy_primitives::{Address, U256};
use eyre::eyre;
use tracing::{debug, error, info, warn};

use crate::{
    events::RawEvent,
    generation::LoanBoard,
    reducer::{enrich, reduce, FoldOrder},
    registry::AddressRegistry,
    state::LoanState,
};

/// Read access to deployed loan contracts.
#[allow(async_fn_in_trait)]
pub trait LedgerSource {
    /// Every log the contract has emitted, in the order the node returns them.
    async fn query_events(&self, contract: Address) -> eyre::Result<Vec<RawEvent>>;

    /// Current `totalDue()` in base units.
    async fn total_due(&self, contract: Address) -> eyre::Result<U256>;

    /// Current `dueDate()` in unix seconds.
    async fn due_date(&self, contract: Address) -> eyre::Result<U256>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryError {
    Registry(String),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(msg) => write!(f, "could not read loan registry: {msg}"),
        }
    }
}

impl std::error::Error for HistoryError {}

pub struct LoanHistory<L, R> {
    ledger: Option<L>,
    registry: R,
    order: FoldOrder,
    call_timeout: Option<Duration>,
}

impl<L: LedgerSource, R: AddressRegistry> LoanHistory<L, R> {
    pub fn new(ledger: Option<L>, registry: R) -> Self {
        Self {
            ledger,
            registry,
            order: FoldOrder::default(),
            call_timeout: None,
        }
    }

    pub fn with_fold_order(mut self, order: FoldOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Runs one fetch cycle for `identity`.
    ///
    /// Without an identity or a ledger the result is empty. A failing contract
    /// becomes an error entry and never stops the rest of the batch.
    pub async fn fetch(&self, identity: Option<Address>) -> Result<Vec<LoanState>, HistoryError> {
        let (Some(ledger), Some(identity)) = (self.ledger.as_ref(), identity) else {
            debug!("no ledger or identity, skipping fetch");
            return Ok(Vec::new());
        };

        let registered = self
            .registry
            .addresses(identity)
            .map_err(|e| HistoryError::Registry(e.to_string()))?;

        let mut contracts: Vec<Address> = Vec::with_capacity(registered.len());
        for address in registered {
            if !contracts.contains(&address) {
                contracts.push(address);
            }
        }
        info!(%identity, contracts = contracts.len(), "fetching loan history");

        let mut loans = Vec::with_capacity(contracts.len());
        for contract in contracts {
            match self._load(ledger, contract).await {
                Ok(state) => loans.push(state),
                Err(e) => {
                    error!(%contract, error = %e, "failed to process loan contract");
                    loans.push(LoanState::failed(contract, e.to_string()));
                }
            }
        }
        Ok(loans)
    }

    /// Fetches and publishes into `board` unless a newer fetch started meanwhile.
    pub async fn refresh(&self, board: &LoanBoard, identity: Option<Address>) -> bool {
        let ticket = board.begin_fetch();
        let result = self.fetch(identity).await;
        board.apply(ticket, result)
    }

    async fn _load(&self, ledger: &L, contract: Address) -> eyre::Result<LoanState> {
        let raw = self._guarded("event query", ledger.query_events(contract)).await?;
        debug!(%contract, events = raw.len(), "events loaded");

        let state = reduce(contract, &raw, self.order)?;

        let total_due = match self._guarded("totalDue read", ledger.total_due(contract)).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(%contract, error = %e, "keeping event-derived total due");
                None
            }
        };
        let due_date = match self._guarded("dueDate read", ledger.due_date(contract)).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(%contract, error = %e, "due date unavailable");
                None
            }
        };

        Ok(enrich(state, total_due, due_date))
    }

    async fn _guarded<T>(
        &self,
        what: &'static str,
        call: impl Future<Output = eyre::Result<T>>,
    ) -> eyre::Result<T> {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| eyre!("{what} timed out after {limit:?}"))?,
            None => call.await,
        }
    }
}
