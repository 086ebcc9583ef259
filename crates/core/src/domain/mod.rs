// Domain Layer - Messages and queue naming rules

pub mod error;
pub mod message;
pub mod queue;

// Re-exports
pub use error::DomainError;
pub use message::Message;
pub use queue::{validate_queue_name, MAX_QUEUE_NAME_LEN};
