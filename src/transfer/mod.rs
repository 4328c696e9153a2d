//! The transfer domain service: the atomic sync primitive (C5), the
//! async submit/status surface (C6/C9), and the consumer-side processor
//! and retry/dead-letter classification (C7).

pub mod consumer;
mod messages;
mod service;

pub use messages::{DlqMessage, TransferMessage};
pub use service::{ProcessOutcome, TransferService, MAX_RETRIES, TOPIC_TRANSACTIONS, TOPIC_TRANSACTIONS_DLQ};
