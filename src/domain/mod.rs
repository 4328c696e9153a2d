//! Core domain types: accounts, the transfer ledger, and async transfer
//! status records. No I/O lives here — only the arithmetic and state
//! transitions spec.md holds invariant.

mod account;
mod async_transaction;
mod transaction;

pub use account::Account;
pub use async_transaction::{AsyncTransaction, TxStatus};
pub use transaction::Transaction;
