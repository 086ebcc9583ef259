// In-memory Consumer

use crate::queue::{MemoryQueue, SharedState};
use async_trait::async_trait;
use hopper_core::domain::Message;
use hopper_core::port::{BrokerError, BrokerResult, Consumer, ConsumerState};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Consumer over one in-memory queue
///
/// Dropping a consumer that still holds an unacknowledged message puts the
/// message back at the head of its queue, same as `close`.
pub struct MemoryConsumer {
    name: String,
    queue: Arc<MemoryQueue>,
    shared: Arc<SharedState>,
    state: ConsumerState,
    closed: bool,
}

impl MemoryConsumer {
    pub(crate) fn new(name: &str, queue: Arc<MemoryQueue>, shared: Arc<SharedState>) -> Self {
        Self {
            name: name.to_string(),
            queue,
            shared,
            state: ConsumerState::Idle,
            closed: false,
        }
    }

    /// Return the in-flight message to the head of the queue, if any
    fn requeue(&mut self) -> bool {
        match std::mem::take(&mut self.state) {
            ConsumerState::AwaitingAck(message) => {
                self.queue.push_front(message);
                true
            }
            ConsumerState::Idle => false,
        }
    }
}

#[async_trait]
impl Consumer for MemoryConsumer {
    fn queue(&self) -> &str {
        &self.name
    }

    async fn consume_timeout(&mut self, timeout: Duration) -> BrokerResult<Message> {
        if self.closed {
            return Err(BrokerError::Closed);
        }
        if self.state.needs_ack() {
            return Err(BrokerError::ProtocolViolation);
        }

        let deadline = (!timeout.is_zero()).then(|| Instant::now() + timeout);
        let queue = Arc::clone(&self.queue);

        loop {
            // Register for wakeups before looking, so a publish between the
            // check and the wait is not missed.
            let notified = queue.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.shared.is_closed() {
                return Err(BrokerError::Closed);
            }

            // Pop and state change with no await in between: dropping this
            // future can never lose or duplicate a message.
            if let Some(message) = queue.pop_front() {
                self.state = ConsumerState::AwaitingAck(message.clone());
                return Ok(message);
            }

            match deadline {
                Some(deadline) => {
                    tokio::select! {
                        _ = notified => {},
                        _ = sleep_until(deadline) => return Err(BrokerError::TimedOut(timeout)),
                    }
                }
                None => notified.await,
            }
        }
    }

    async fn ack(&mut self) -> BrokerResult<()> {
        match std::mem::take(&mut self.state) {
            ConsumerState::AwaitingAck(_) => Ok(()),
            ConsumerState::Idle => Err(BrokerError::NotNeeded("ack")),
        }
    }

    async fn nack(&mut self) -> BrokerResult<()> {
        if self.requeue() {
            Ok(())
        } else {
            Err(BrokerError::NotNeeded("nack"))
        }
    }

    async fn close(&mut self) -> BrokerResult<()> {
        if self.requeue() {
            debug!(queue = %self.name, "Requeued in-flight message on close");
        }
        self.closed = true;
        Ok(())
    }
}

impl Drop for MemoryConsumer {
    fn drop(&mut self) {
        if self.requeue() {
            debug!(queue = %self.name, "Requeued in-flight message on drop");
        }
    }
}
