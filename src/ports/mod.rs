//! Trait contracts between the transfer service and its concrete
//! adapters (Postgres repositories/unit-of-work, the lock manager, the
//! message broker). Concrete implementations live in `db`, `lock`, and
//! `broker`; `transfer` depends only on these traits.

mod broker;
mod lock;
mod repository;

pub use broker::{Message, MessageConsumer, MessageProducer};
pub use lock::LockManager;
pub use repository::{
    AccountRepository, AsyncTransactionRepository, TransactionContext, UnitOfWork,
};
