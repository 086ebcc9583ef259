// Hopper Infrastructure - In-memory Adapter
// Implements: Broker, Consumer, Publisher (volatile reference backend)

mod broker;
mod consumer;
mod publisher;
mod queue;

pub use broker::MemoryBroker;
pub use consumer::MemoryConsumer;
pub use publisher::MemoryPublisher;
