// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid queue name: {0}")]
    InvalidQueueName(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
