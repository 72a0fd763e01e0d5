//! Append-only stock ledger domain.
//!
//! Quantity on hand is never stored; it is folded from transactions. This crate
//! holds the transaction model, the balance fold, the posting-set planner that
//! enforces non-negative stock and the reorder summary. No IO.

pub mod balance;
pub mod plan;
pub mod summary;
pub mod transaction;

pub use balance::{LedgerTotals, StockLevel};
pub use plan::{ItemDelta, adjust_posting, plan_postings};
pub use summary::{StockSummaryLine, build_summary};
pub use transaction::{Direction, NewTransaction, Posting, StockTransaction, TransactionType};
