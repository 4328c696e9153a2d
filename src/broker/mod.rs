//! Message broker adapter, implementing the `ports::{MessageProducer,
//! MessageConsumer}` contracts over `rskafka`.
//!
//! `rskafka` is a low-level client: it has no consumer-group
//! coordinator or broker-side offset-commit API, so "manual offset
//! commit" here means what the original Go `sarama` consumer's
//! `AutoCommit.Enable = false` did one layer up, implemented at the
//! application layer: [`consumer::KafkaConsumer`] persists the last
//! successfully processed offset per topic/partition/group in Postgres
//! (`PgOffsetStore`) and only commits it once the handler returns `Ok`,
//! resuming from that checkpoint (rather than `StartOffset::Earliest`)
//! on every subscribe (spec §4.7's at-least-once guarantee across
//! crash/restart).

mod consumer;
mod producer;

pub use consumer::KafkaConsumer;
pub use producer::KafkaProducer;

use crate::error::TransferError;
use rskafka::client::{Client, ClientBuilder};

pub async fn connect(bootstrap_brokers: &[String]) -> Result<Client, TransferError> {
    ClientBuilder::new(bootstrap_brokers.to_vec())
        .build()
        .await
        .map_err(|e| TransferError::Transport(e.to_string()))
}
