// In-memory Broker Implementation

use crate::queue::SharedState;
use crate::{MemoryConsumer, MemoryPublisher};
use async_trait::async_trait;
use hopper_core::domain::validate_queue_name;
use hopper_core::port::{Broker, BrokerError, BrokerResult, Consumer, Publisher};
use std::sync::Arc;
use tracing::{debug, info};

/// Volatile broker keeping every queue in process memory
///
/// Each queue has its own lock and wakeup, so consumers on different queues
/// never contend. Cloning yields another handle to the same queues.
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    shared: Arc<SharedState>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages currently waiting in `queue` (in-flight ones excluded)
    pub fn queue_len(&self, queue: &str) -> usize {
        self.shared
            .existing(queue)
            .map(|q| q.len())
            .unwrap_or(0)
    }

    /// Names of every queue created so far, sorted
    pub fn queue_names(&self) -> Vec<String> {
        self.shared.names()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    fn open(&self, queue: &str) -> BrokerResult<()> {
        validate_queue_name(queue)?;
        if self.shared.is_closed() {
            return Err(BrokerError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn close(&self) -> BrokerResult<()> {
        if self.shared.close() {
            info!(queues = self.shared.names().len(), "Memory broker closed");
        }
        Ok(())
    }

    async fn consumer(&self, queue: &str) -> BrokerResult<Box<dyn Consumer>> {
        self.open(queue)?;
        debug!(queue = %queue, "Opening consumer");
        let handle = self.shared.queue(queue);
        Ok(Box::new(MemoryConsumer::new(
            queue,
            handle,
            Arc::clone(&self.shared),
        )))
    }

    async fn publisher(&self, queue: &str) -> BrokerResult<Box<dyn Publisher>> {
        self.open(queue)?;
        debug!(queue = %queue, "Opening publisher");
        let handle = self.shared.queue(queue);
        Ok(Box::new(MemoryPublisher::new(
            queue,
            handle,
            Arc::clone(&self.shared),
        )))
    }
}
