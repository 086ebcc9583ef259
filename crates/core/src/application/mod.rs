// Application Layer - Worker loop, worker pool and retry policy

pub mod backoff;
pub mod pool;
pub mod processor;
pub mod worker;

// Re-exports
pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use pool::Pool;
pub use processor::Processor;
pub use worker::{shutdown_channel, ShutdownSender, ShutdownToken, Worker, WorkerConfig, WorkerStats};
