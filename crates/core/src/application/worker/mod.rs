// Worker - Message execution loop

mod config;
pub mod constants;
mod panic_guard;
mod shutdown;
mod stats;

pub use config::WorkerConfig;
pub use panic_guard::{execute_guarded_async, PanicGuardResult};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use stats::WorkerStats;

use crate::application::backoff::ExponentialBackoff;
use crate::application::processor::Processor;
use crate::domain::Message;
use crate::port::{Broker, BrokerResult, Consumer, Publisher};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Worker binds one consumer/publisher pair on a queue to a processor
///
/// It owns both handles exclusively and closes them when it stops.
pub struct Worker {
    id: String,
    queue: String,
    consumer: Box<dyn Consumer>,
    publisher: Box<dyn Publisher>,
    processor: Arc<dyn Processor>,
    config: WorkerConfig,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Open a consumer and a publisher on `queue` and bind them to `processor`
    ///
    /// If the publisher cannot be opened the already-opened consumer is closed
    /// before the error is returned.
    pub async fn new(
        broker: &dyn Broker,
        queue: &str,
        processor: Arc<dyn Processor>,
        config: WorkerConfig,
        stats: Arc<WorkerStats>,
    ) -> BrokerResult<Self> {
        let mut consumer = broker.consumer(queue).await?;
        let publisher = match broker.publisher(queue).await {
            Ok(publisher) => publisher,
            Err(e) => {
                if let Err(close_err) = consumer.close().await {
                    warn!(queue = %queue, error = %close_err, "Failed to close consumer");
                }
                return Err(e);
            }
        };

        Ok(Self::from_parts(consumer, publisher, processor, config, stats))
    }

    /// Build a worker around handles the caller already opened
    pub fn from_parts(
        consumer: Box<dyn Consumer>,
        publisher: Box<dyn Publisher>,
        processor: Arc<dyn Processor>,
        config: WorkerConfig,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id: format!("worker-{}", Uuid::new_v4()),
            queue: consumer.queue().to_string(),
            consumer,
            publisher,
            processor,
            config,
            stats,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run the worker loop until `shutdown` is closed
    ///
    /// Consume and processing errors are logged and retried with backoff; the
    /// only exit is the stop signal. Publisher then consumer are closed on exit.
    pub async fn run(mut self, mut shutdown: ShutdownToken) {
        info!(worker_id = %self.id, queue = %self.queue, "Worker started");
        let mut backoff = ExponentialBackoff::new(self.config.backoff);

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            if let Some(delay) = self.step(&mut backoff).await {
                tokio::select! {
                    _ = sleep(delay) => {},
                    _ = shutdown.wait() => {
                        debug!(worker_id = %self.id, "Worker interrupted during backoff");
                        break;
                    }
                }
            }
        }

        self.close().await;
        info!(worker_id = %self.id, queue = %self.queue, "Worker stopped");
    }

    /// One consume/process/settle round; returns the backoff delay to apply, if any
    ///
    /// Every returned delay is counted as idle time; a successful consume
    /// zeroes it and restarts the backoff from its initial interval.
    async fn step(&mut self, backoff: &mut ExponentialBackoff) -> Option<Duration> {
        let message = match self.consumer.consume_timeout(self.config.consume_timeout).await {
            Ok(message) => message,
            Err(e) => {
                let delay = self.back_off(backoff);
                if e.is_timeout() {
                    debug!(
                        worker_id = %self.id,
                        delay_ms = delay.as_millis() as u64,
                        "No message available, backing off"
                    );
                } else {
                    warn!(
                        worker_id = %self.id,
                        queue = %self.queue,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Consume failed, backing off"
                    );
                }
                return Some(delay);
            }
        };

        backoff.reset();
        self.stats.reset_idle();

        let processor = Arc::clone(&self.processor);
        let outcome = execute_guarded_async(processor.process(message)).await;
        let failure = match outcome {
            PanicGuardResult::Success(Ok(outputs)) => {
                self.publish_all(outputs).await;
                if let Err(e) = self.consumer.ack().await {
                    error!(worker_id = %self.id, error = %e, "Failed to ack message");
                }
                self.stats.record_processed();
                return None;
            }
            PanicGuardResult::Success(Err(e)) => format!("{:#}", e),
            PanicGuardResult::Panicked(msg) => format!("processor panicked: {}", msg),
        };

        // Redelivered at the head of the queue; never dropped
        if let Err(e) = self.consumer.nack().await {
            error!(worker_id = %self.id, error = %e, "Failed to nack message");
        }
        self.stats.record_failed();

        let delay = self.back_off(backoff);
        warn!(
            worker_id = %self.id,
            queue = %self.queue,
            error = %failure,
            delay_ms = delay.as_millis() as u64,
            "Could not process message, requeued"
        );
        Some(delay)
    }

    fn back_off(&self, backoff: &mut ExponentialBackoff) -> Duration {
        let delay = backoff.next_backoff();
        self.stats.add_idle(delay);
        delay
    }

    /// Publish derived messages in order; a failure does not stop the rest
    async fn publish_all(&mut self, outputs: Vec<Message>) {
        for output in outputs {
            if let Err(e) = self.publisher.publish(output).await {
                error!(
                    worker_id = %self.id,
                    queue = %self.queue,
                    error = %e,
                    "Failed to publish derived message"
                );
            }
        }
    }

    /// Close the publisher, then the consumer (which requeues any in-flight message)
    pub(crate) async fn close(&mut self) {
        if let Err(e) = self.publisher.close().await {
            error!(worker_id = %self.id, error = %e, "Failed to close publisher");
        }
        if let Err(e) = self.consumer.close().await {
            error!(worker_id = %self.id, error = %e, "Failed to close consumer");
        }
    }
}
