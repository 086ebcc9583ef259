// Broker Port (Interface)
// Backends implement Broker/Consumer/Publisher; Worker and Pool only see these traits.

use super::{Consumer, Publisher};
use crate::domain::DomainError;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Broker errors
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Consume called while a message is still awaiting ack (caller bug)
    #[error("Protocol violation: cannot consume while a message is awaiting ack")]
    ProtocolViolation,

    /// Ack/Nack called with nothing pending
    #[error("{0} not needed: no message is awaiting ack")]
    NotNeeded(&'static str),

    #[error("Timed out after {0:?} waiting for a message")]
    TimedOut(Duration),

    #[error("Broker handle is closed")]
    Closed,

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Opaque transport/backend failure from non-reference backends
    #[error("Backend error: {0}")]
    Backend(String),
}

impl BrokerError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, BrokerError::TimedOut(_))
    }
}

pub type BrokerResult<T> = std::result::Result<T, BrokerError>;

/// Broker hands out consumers and publishers for named queues
///
/// Implementations:
/// - MemoryBroker (hopper-infra-memory): volatile reference backend
#[async_trait]
pub trait Broker: Send + Sync {
    /// Shut the broker down, releasing backend resources (idempotent)
    async fn close(&self) -> BrokerResult<()>;

    /// Open a consumer for `queue`, creating the queue if needed
    ///
    /// # Errors
    /// - `BrokerError::Domain` if the queue name is invalid
    /// - `BrokerError::Closed` if the broker was closed
    async fn consumer(&self, queue: &str) -> BrokerResult<Box<dyn Consumer>>;

    /// Open a publisher for `queue`, creating the queue if needed
    async fn publisher(&self, queue: &str) -> BrokerResult<Box<dyn Publisher>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::Message;
    use crate::port::ConsumerState;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Broker whose handles can never be opened
    pub struct UnavailableBroker {
        reason: String,
    }

    impl UnavailableBroker {
        pub fn new(reason: impl Into<String>) -> Self {
            Self {
                reason: reason.into(),
            }
        }
    }

    #[async_trait]
    impl Broker for UnavailableBroker {
        async fn close(&self) -> BrokerResult<()> {
            Ok(())
        }
        async fn consumer(&self, _queue: &str) -> BrokerResult<Box<dyn Consumer>> {
            Err(BrokerError::Backend(self.reason.clone()))
        }
        async fn publisher(&self, _queue: &str) -> BrokerResult<Box<dyn Publisher>> {
            Err(BrokerError::Backend(self.reason.clone()))
        }
    }

    /// One scripted outcome of `consume_timeout`
    #[derive(Debug, Clone)]
    pub enum MockStep {
        Deliver(Message),
        /// Fail with `BrokerError::Backend`
        Fail(String),
    }

    /// What a mock consumer/publisher pair observed
    #[derive(Debug, Default)]
    pub struct MockLog {
        pub consumed: usize,
        pub backend_errors: usize,
        pub acked: Vec<Message>,
        pub nacked: Vec<Message>,
        pub published: Vec<Message>,
        pub consumer_closed: bool,
        pub publisher_closed: bool,
    }

    /// Consumer that replays a script; nacked messages go back to its front
    ///
    /// Once the script is empty every consume sleeps for its timeout and
    /// returns `TimedOut`.
    pub struct MockConsumer {
        queue: String,
        script: VecDeque<MockStep>,
        state: ConsumerState,
        log: Arc<Mutex<MockLog>>,
    }

    impl MockConsumer {
        pub fn new(
            queue: impl Into<String>,
            script: impl IntoIterator<Item = MockStep>,
            log: Arc<Mutex<MockLog>>,
        ) -> Self {
            Self {
                queue: queue.into(),
                script: script.into_iter().collect(),
                state: ConsumerState::Idle,
                log,
            }
        }
    }

    #[async_trait]
    impl Consumer for MockConsumer {
        fn queue(&self) -> &str {
            &self.queue
        }
        async fn consume_timeout(&mut self, timeout: Duration) -> BrokerResult<Message> {
            if self.state.needs_ack() {
                return Err(BrokerError::ProtocolViolation);
            }
            match self.script.pop_front() {
                Some(MockStep::Deliver(message)) => {
                    self.log.lock().unwrap().consumed += 1;
                    self.state = ConsumerState::AwaitingAck(message.clone());
                    Ok(message)
                }
                Some(MockStep::Fail(reason)) => {
                    self.log.lock().unwrap().backend_errors += 1;
                    Err(BrokerError::Backend(reason))
                }
                None => {
                    tokio::time::sleep(timeout).await;
                    Err(BrokerError::TimedOut(timeout))
                }
            }
        }
        async fn ack(&mut self) -> BrokerResult<()> {
            match std::mem::take(&mut self.state) {
                ConsumerState::AwaitingAck(message) => {
                    self.log.lock().unwrap().acked.push(message);
                    Ok(())
                }
                ConsumerState::Idle => Err(BrokerError::NotNeeded("ack")),
            }
        }
        async fn nack(&mut self) -> BrokerResult<()> {
            match std::mem::take(&mut self.state) {
                ConsumerState::AwaitingAck(message) => {
                    self.log.lock().unwrap().nacked.push(message.clone());
                    self.script.push_front(MockStep::Deliver(message));
                    Ok(())
                }
                ConsumerState::Idle => Err(BrokerError::NotNeeded("nack")),
            }
        }
        async fn close(&mut self) -> BrokerResult<()> {
            if self.state.needs_ack() {
                self.nack().await?;
            }
            self.log.lock().unwrap().consumer_closed = true;
            Ok(())
        }
    }

    /// Publisher that records messages, optionally rejecting one payload
    pub struct MockPublisher {
        queue: String,
        reject: Option<Message>,
        log: Arc<Mutex<MockLog>>,
    }

    impl MockPublisher {
        pub fn new(queue: impl Into<String>, log: Arc<Mutex<MockLog>>) -> Self {
            Self {
                queue: queue.into(),
                reject: None,
                log,
            }
        }

        pub fn rejecting(mut self, message: impl Into<Message>) -> Self {
            self.reject = Some(message.into());
            self
        }
    }

    #[async_trait]
    impl Publisher for MockPublisher {
        fn queue(&self) -> &str {
            &self.queue
        }
        async fn publish(&self, message: Message) -> BrokerResult<()> {
            if self.reject.as_ref() == Some(&message) {
                return Err(BrokerError::Backend("publish rejected".to_string()));
            }
            self.log.lock().unwrap().published.push(message);
            Ok(())
        }
        async fn close(&mut self) -> BrokerResult<()> {
            self.log.lock().unwrap().publisher_closed = true;
            Ok(())
        }
    }
}
