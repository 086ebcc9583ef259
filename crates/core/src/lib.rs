// Hopper Core - Broker contract, Worker loop and Pool
// NO backend dependencies: adapters live in their own crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{Pool, Processor, Worker, WorkerConfig};
pub use domain::Message;
pub use error::{AppError, Result};
pub use port::{Broker, BrokerError, Consumer, Publisher};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
