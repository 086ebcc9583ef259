// Publisher Port (Interface)

use super::broker::BrokerResult;
use crate::domain::Message;
use async_trait::async_trait;

/// Publisher handle bound to a single queue
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Name of the queue this publisher appends to
    fn queue(&self) -> &str;

    /// Append `message` to the tail of the queue
    ///
    /// Safe under concurrent calls from several publishers on the same queue;
    /// each publisher's own call order is preserved.
    async fn publish(&self, message: Message) -> BrokerResult<()>;

    /// Release the publisher (idempotent)
    async fn close(&mut self) -> BrokerResult<()>;
}
