//! Ledger module
//!
//! The Transfer/Deposit Engine commits balance movements through the store;
//! the statement module rebuilds running balances from transaction history.

mod engine;
pub mod statement;

pub use engine::{LedgerReceipt, TransferEngine};
pub use statement::{Statement, StatementEntry, StatementPeriod, StatementSummary};
