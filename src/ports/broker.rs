use async_trait::async_trait;

use crate::error::TransferError;

/// One wire message: an opaque key (used for partition/ordering) and
/// payload bytes. Mirrors the original's `ports.Message{Key, Value}`.
#[derive(Debug, Clone)]
pub struct Message {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

#[async_trait]
pub trait MessageProducer: Send + Sync {
    async fn publish(&self, topic: &str, message: Message) -> Result<(), TransferError>;
}

/// A handle to one delivered message, carrying enough to ack (commit
/// the offset) after the handler succeeds. Consumers must not auto-commit:
/// `ack` is only called once the caller's handler has returned `Ok`.
#[async_trait]
pub trait MessageHandle: Send {
    fn message(&self) -> &Message;
    async fn ack(self: Box<Self>) -> Result<(), TransferError>;
}

#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Blocks, delivering messages from `topic` under `group` to `handler`
    /// one at a time, advancing the persisted checkpoint only after
    /// `handler` returns `Ok`. Returns when `shutdown` is cancelled.
    async fn subscribe(
        &self,
        topic: &str,
        group: &str,
        handler: Box<
            dyn Fn(Box<dyn MessageHandle>) -> futures::future::BoxFuture<'static, Result<(), TransferError>>
                + Send
                + Sync,
        >,
        shutdown: tokio_util::sync::CancellationToken,
    ) -> Result<(), TransferError>;
}
