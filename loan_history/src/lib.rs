//! Loan history for wallet-owned loan contracts.
//!
//! Each registered contract's event log is replayed into a [`LoanState`] and
//! then refreshed with the contract's live `totalDue()` and `dueDate()`.

pub mod amount;
pub mod config;
pub mod events;
pub mod generation;
pub mod history;
pub mod ledger;
pub mod reducer;
pub mod registry;
pub mod state;

pub use amount::Amount;
pub use events::{ArgValue, EventArgs, LoanEvent, LoanEventKind, RawEvent};
pub use generation::{BoardView, FetchGeneration, FetchTicket, LoanBoard};
pub use history::{HistoryError, LedgerSource, LoanHistory};
pub use ledger::EthersLedger;
pub use reducer::{enrich, reduce, FoldOrder, ReduceError};
pub use registry::{AddressRegistry, JsonFileRegistry, MemoryRegistry};
pub use state::{LoanState, LoanStatus};

#[cfg(test)]
mod test_history;
#[cfg(test)]
mod test_generation;
