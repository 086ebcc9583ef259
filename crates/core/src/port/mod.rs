// Port Layer - Interfaces every queue backend implements

pub mod broker;
pub mod consumer;
pub mod publisher;

// Re-exports
pub use broker::{Broker, BrokerError, BrokerResult};
pub use consumer::{Consumer, ConsumerState};
pub use publisher::Publisher;
