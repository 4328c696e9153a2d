//! Transfer Processing Service
//!
//! A money-transfer processor: accounts with integer balances, an atomic
//! transfer primitive serialized by cross-account locking, and an
//! asynchronous submit/consume pipeline with retry and dead-lettering.
//!
//! # Architecture
//!
//! Two cooperating processes share one Postgres database and one message
//! broker:
//!
//! - **`tps-server`**: the sync HTTP surface. Accepts transfers and either
//!   executes them immediately or records them as pending and enqueues a
//!   message.
//! - **`tps-consumer`**: pulls queued transfer messages, executes the same
//!   transfer primitive, and classifies failures into business (terminal)
//!   vs transient (retried, then dead-lettered).
//!
//! # Safety invariants
//!
//! 1. Cross-account locks are acquired in a single global order (sorted
//!    account IDs) so no two concurrent transfers can deadlock.
//! 2. The two balance updates and the ledger insert happen inside one
//!    database transaction; observers never see a partial transfer.
//! 3. An `AsyncTransaction` status is monotonic: `pending -> completed`
//!    or `pending -> failed`, never reversed.

pub mod api;
pub mod broker;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod lock;
pub mod ports;
pub mod telemetry;
pub mod transfer;

pub use error::TransferError;
