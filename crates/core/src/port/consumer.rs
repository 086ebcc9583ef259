// Consumer Port (Interface)

use super::broker::BrokerResult;
use crate::domain::Message;
use async_trait::async_trait;
use std::time::Duration;

/// Acknowledgement state of a consumer
///
/// A consumer holds at most one unacknowledged message at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConsumerState {
    #[default]
    Idle,
    /// Holding the last dequeued message until `ack` or `nack`
    AwaitingAck(Message),
}

impl ConsumerState {
    pub fn needs_ack(&self) -> bool {
        matches!(self, ConsumerState::AwaitingAck(_))
    }
}

/// Consumer handle bound to a single queue
///
/// Every message returned by `consume`/`consume_timeout` must be settled with
/// `ack` or `nack` before the next consume. Handles are owned by one task and
/// are not shared across threads.
#[async_trait]
pub trait Consumer: Send {
    /// Name of the queue this consumer reads from
    fn queue(&self) -> &str;

    /// Wait up to `timeout` for the next message (`Duration::ZERO` waits forever)
    ///
    /// # Errors
    /// - `BrokerError::ProtocolViolation` if a message is still awaiting ack
    /// - `BrokerError::TimedOut` if nothing arrived in time
    /// - `BrokerError::Closed` if the consumer or its broker was closed
    async fn consume_timeout(&mut self, timeout: Duration) -> BrokerResult<Message>;

    /// Wait indefinitely for the next message
    async fn consume(&mut self) -> BrokerResult<Message> {
        self.consume_timeout(Duration::ZERO).await
    }

    /// Consume and immediately acknowledge, so no redelivery can happen
    async fn consume_ack(&mut self) -> BrokerResult<Message> {
        let message = self.consume().await?;
        self.ack().await?;
        Ok(message)
    }

    /// Discard the message returned by the last consume
    ///
    /// # Errors
    /// - `BrokerError::NotNeeded` if no message is awaiting ack
    async fn ack(&mut self) -> BrokerResult<()>;

    /// Return the message from the last consume to the head of its queue
    ///
    /// # Errors
    /// - `BrokerError::NotNeeded` if no message is awaiting ack
    async fn nack(&mut self) -> BrokerResult<()>;

    /// Release the consumer, nacking any in-flight message first (idempotent)
    async fn close(&mut self) -> BrokerResult<()>;
}
