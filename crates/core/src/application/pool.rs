// Pool - Dynamically sized set of workers on one queue

use crate::application::processor::Processor;
use crate::application::worker::{shutdown_channel, ShutdownSender, Worker, WorkerConfig, WorkerStats};
use crate::error::{AppError, Result};
use crate::port::Broker;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Worker bookkeeping, guarded by the pool's own lock
#[derive(Default)]
struct Registry {
    /// Stop senders of workers that have not been told to exit
    active: Vec<ShutdownSender>,
    /// Every spawned worker task, including ones already told to exit
    handles: Vec<JoinHandle<()>>,
    stopped: bool,
}

/// A set of workers that all consume from the same queue
///
/// Dropping a pool closes every stop signal, so its workers wind down on
/// their own; call `stop` to also wait for them.
pub struct Pool {
    queue: String,
    broker: Arc<dyn Broker>,
    processor: Arc<dyn Processor>,
    config: WorkerConfig,
    stats: Arc<WorkerStats>,
    registry: Mutex<Registry>,
}

impl Pool {
    /// Create an empty pool with the default worker configuration
    pub fn new(
        broker: Arc<dyn Broker>,
        queue: impl Into<String>,
        processor: impl Processor + 'static,
    ) -> Self {
        Self::with_config(broker, queue, processor, WorkerConfig::default())
    }

    pub fn with_config(
        broker: Arc<dyn Broker>,
        queue: impl Into<String>,
        processor: impl Processor + 'static,
        config: WorkerConfig,
    ) -> Self {
        Self {
            queue: queue.into(),
            broker,
            processor: Arc::new(processor),
            config,
            stats: Arc::new(WorkerStats::new()),
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Change the number of workers by `n`
    ///
    /// - `n > 0` spawns `n` workers. Not atomic: if opening handles fails
    ///   part-way, the workers spawned so far keep running and the error is
    ///   returned.
    /// - `n < 0` stops `|n|` workers, or fails with `InsufficientWorkers`
    ///   (leaving the pool untouched) if fewer are running.
    /// - `n == 0` does nothing.
    pub async fn add_workers(&self, n: isize) -> Result<()> {
        match n.cmp(&0) {
            Ordering::Greater => {
                for _ in 0..n {
                    self.add_worker().await?;
                }
            }
            Ordering::Less => self.remove_workers(n.unsigned_abs())?,
            Ordering::Equal => return Ok(()),
        }

        info!(queue = %self.queue, workers = self.len(), change = n, "Pool resized");
        Ok(())
    }

    /// Number of workers that have not been told to stop
    pub fn len(&self) -> usize {
        self.registry().active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Worker tasks that have not exited yet (including ones winding down)
    pub fn running(&self) -> usize {
        self.registry()
            .handles
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Stop every worker and wait for all of them to exit
    ///
    /// Terminal: the pool refuses new workers afterwards.
    pub async fn stop(&self) {
        let handles = {
            let mut registry = self.registry();
            registry.stopped = true;
            for stop in registry.active.drain(..) {
                stop.shutdown();
            }
            std::mem::take(&mut registry.handles)
        };

        info!(queue = %self.queue, workers = handles.len(), "Stopping pool");
        for handle in handles {
            if let Err(e) = handle.await {
                error!(queue = %self.queue, error = %e, "Worker task failed");
            }
        }
        info!(queue = %self.queue, processed = self.stats.processed(), "Pool stopped");
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Backoff time accumulated since a worker in this pool last got a message
    pub fn total_time_since_work(&self) -> Duration {
        self.stats.time_since_work()
    }

    /// Messages processed and acknowledged by this pool
    pub fn processed(&self) -> u64 {
        self.stats.processed()
    }

    /// Processing attempts that ended in a nack
    pub fn failed(&self) -> u64 {
        self.stats.failed()
    }

    async fn add_worker(&self) -> Result<()> {
        if self.registry().stopped {
            return Err(AppError::PoolStopped);
        }

        let mut worker = Worker::new(
            self.broker.as_ref(),
            &self.queue,
            Arc::clone(&self.processor),
            self.config,
            Arc::clone(&self.stats),
        )
        .await?;
        let (stop_tx, stop_rx) = shutdown_channel();

        {
            let mut registry = self.registry();
            if !registry.stopped {
                registry.handles.retain(|handle| !handle.is_finished());
                debug!(queue = %self.queue, worker_id = %worker.id(), "Spawning worker");
                registry.handles.push(tokio::spawn(worker.run(stop_rx)));
                registry.active.push(stop_tx);
                return Ok(());
            }
        }

        // Stopped while the handles were opening: release them here so no
        // task outlives the stop call.
        worker.close().await;
        Err(AppError::PoolStopped)
    }

    /// Check and removal happen under one lock so a concurrent caller
    /// can never drive the count below zero.
    fn remove_workers(&self, n: usize) -> Result<()> {
        let mut registry = self.registry();
        let available = registry.active.len();
        if n > available {
            return Err(AppError::InsufficientWorkers {
                requested: n,
                available,
            });
        }

        // Any worker may be chosen; take the most recently added
        for stop in registry.active.drain(available - n..) {
            stop.shutdown();
        }
        Ok(())
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::backoff::BackoffConfig;
    use crate::application::processor;
    use crate::domain::Message;
    use crate::port::broker::mocks::{MockConsumer, MockLog, MockPublisher, MockStep, UnavailableBroker};
    use crate::port::{BrokerResult, Consumer, Publisher};
    use async_trait::async_trait;
    use tokio::sync::Notify;
    use tokio_test::{assert_err, assert_ok};

    /// Broker whose consumers only open once the gate is released
    struct GatedBroker {
        gate: Arc<Notify>,
        log: Arc<std::sync::Mutex<MockLog>>,
    }

    #[async_trait]
    impl Broker for GatedBroker {
        async fn close(&self) -> BrokerResult<()> {
            Ok(())
        }

        async fn consumer(&self, queue: &str) -> BrokerResult<Box<dyn Consumer>> {
            self.gate.notified().await;
            Ok(Box::new(MockConsumer::new(queue, Vec::<MockStep>::new(), self.log.clone())))
        }

        async fn publisher(&self, queue: &str) -> BrokerResult<Box<dyn Publisher>> {
            Ok(Box::new(MockPublisher::new(queue, self.log.clone())))
        }
    }

    fn unavailable_pool() -> Pool {
        Pool::with_config(
            Arc::new(UnavailableBroker::new("connection refused")),
            "test_queue",
            processor::from_fn(|_msg: Message| Ok(vec![])),
            WorkerConfig::new()
                .with_consume_timeout(Duration::from_millis(10))
                .with_backoff(BackoffConfig::constant(Duration::from_millis(5))),
        )
    }

    #[tokio::test]
    async fn test_zero_is_noop() {
        let pool = unavailable_pool();
        assert_ok!(pool.add_workers(0).await);
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_remove_from_empty_pool_fails() {
        let pool = unavailable_pool();
        let err = assert_err!(pool.add_workers(-1).await);
        assert!(matches!(
            err,
            AppError::InsufficientWorkers {
                requested: 1,
                available: 0
            }
        ));
    }

    #[tokio::test]
    async fn test_add_surfaces_broker_error() {
        let pool = unavailable_pool();
        let err = assert_err!(pool.add_workers(3).await);
        assert!(matches!(err, AppError::Broker(_)));
        assert_eq!(pool.len(), 0);
    }

    #[tokio::test]
    async fn test_stop_on_empty_pool_returns() {
        let pool = unavailable_pool();
        pool.stop().await;
        assert_eq!(pool.running(), 0);
        assert!(matches!(pool.add_workers(1).await, Err(AppError::PoolStopped)));
    }

    #[tokio::test]
    async fn test_worker_opened_during_stop_is_closed_not_spawned() {
        let gate = Arc::new(Notify::new());
        let log = Arc::new(std::sync::Mutex::new(MockLog::default()));
        let pool = Arc::new(Pool::new(
            Arc::new(GatedBroker {
                gate: gate.clone(),
                log: log.clone(),
            }),
            "test_queue",
            processor::from_fn(|_msg: Message| Ok(vec![])),
        ));

        let adding = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.add_workers(1).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        pool.stop().await;
        gate.notify_one();

        let result = adding.await.unwrap();
        assert!(matches!(result, Err(AppError::PoolStopped)));
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.running(), 0);

        let log = log.lock().unwrap();
        assert!(log.publisher_closed);
        assert!(log.consumer_closed);
    }
}
