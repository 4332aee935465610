use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, PoisonError,
};

use tracing::debug;

use crate::{history::HistoryError, state::LoanState};

/// Token identifying one fetch cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing fetch tickets.
#[derive(Debug, Default)]
pub struct FetchGeneration {
    latest: AtomicU64,
}

impl FetchGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> FetchTicket {
        FetchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// What a dashboard shows for the current identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoardView {
    pub loading: bool,
    pub loans: Vec<LoanState>,
    pub error: Option<String>,
}

/// Display state guarded against overlapping fetch cycles.
#[derive(Debug, Default)]
pub struct LoanBoard {
    generation: FetchGeneration,
    view: Mutex<BoardView>,
}

impl LoanBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&self) -> FetchTicket {
        let ticket = self.generation.begin();
        self.view.lock().unwrap_or_else(PoisonError::into_inner).loading = true;
        ticket
    }

    /// Publishes `result` if `ticket` is still the latest one issued.
    pub fn apply(&self, ticket: FetchTicket, result: Result<Vec<LoanState>, HistoryError>) -> bool {
        let mut view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        // checked under the lock so a newer apply cannot interleave
        if !self.generation.is_current(ticket) {
            debug!(ticket = ticket.value(), "discarding stale fetch result");
            return false;
        }
        view.loading = false;
        match result {
            Ok(loans) => {
                view.loans = loans;
                view.error = None;
            }
            Err(e) => {
                view.loans.clear();
                view.error = Some(e.to_string());
            }
        }
        true
    }

    pub fn snapshot(&self) -> BoardView {
        self.view.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
