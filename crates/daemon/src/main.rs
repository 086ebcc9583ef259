//! Hopper - demo daemon
//!
//! Runs a worker pool on the in-memory broker until Ctrl+C.

mod config;
mod telemetry;
mod words;

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use hopper_core::application::{processor, Pool};
use hopper_core::domain::Message;
use hopper_core::port::Broker;
use hopper_infra_memory::MemoryBroker;

use config::DaemonConfig;

const STOP_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env().context("Invalid configuration")?;

    // 2. Initialize logging
    telemetry::init_logging(config.log_format)?;
    info!("Hopper v{} starting...", hopper_core::VERSION);

    // 3. Wire broker and pool
    let broker = MemoryBroker::new();
    let pool = Pool::with_config(
        Arc::new(broker.clone()),
        config.queue.clone(),
        processor::from_fn(words::split_words),
        config.worker_config(),
    );

    if let Some(seed) = &config.seed {
        let publisher = broker.publisher(&config.queue).await?;
        publisher.publish(Message::from(seed.as_str())).await?;
        info!(queue = %config.queue, bytes = seed.len(), "Seed message published");
    }

    // 4. Start workers
    let workers = isize::try_from(config.workers).context("HOPPER_WORKERS is too large")?;
    pool.add_workers(workers).await?;

    info!(
        queue = %config.queue,
        workers = pool.len(),
        consume_timeout_ms = config.consume_timeout.as_millis() as u64,
        "System ready. Press Ctrl+C to shutdown"
    );

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown: workers first, then the broker they use
    if tokio::time::timeout(STOP_TIMEOUT, pool.stop()).await.is_err() {
        warn!(timeout_secs = STOP_TIMEOUT.as_secs(), "Workers did not stop in time");
    }
    broker.close().await?;

    info!(
        processed = pool.processed(),
        failed = pool.failed(),
        pending = broker.queue_len(&config.queue),
        "Shutdown complete."
    );
    Ok(())
}
