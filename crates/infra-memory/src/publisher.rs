// In-memory Publisher

use crate::queue::{MemoryQueue, SharedState};
use async_trait::async_trait;
use hopper_core::domain::Message;
use hopper_core::port::{BrokerError, BrokerResult, Publisher};
use std::sync::Arc;

pub struct MemoryPublisher {
    name: String,
    queue: Arc<MemoryQueue>,
    shared: Arc<SharedState>,
    closed: bool,
}

impl MemoryPublisher {
    pub(crate) fn new(name: &str, queue: Arc<MemoryQueue>, shared: Arc<SharedState>) -> Self {
        Self {
            name: name.to_string(),
            queue,
            shared,
            closed: false,
        }
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    fn queue(&self) -> &str {
        &self.name
    }

    async fn publish(&self, message: Message) -> BrokerResult<()> {
        if self.closed || self.shared.is_closed() {
            return Err(BrokerError::Closed);
        }
        self.queue.push_back(message);
        Ok(())
    }

    async fn close(&mut self) -> BrokerResult<()> {
        self.closed = true;
        Ok(())
    }
}
