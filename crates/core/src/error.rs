// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Broker error: {0}")]
    Broker(#[from] crate::port::BrokerError),

    #[error("Cannot remove {requested} workers: only {available} running")]
    InsufficientWorkers { requested: usize, available: usize },

    #[error("Pool has been stopped")]
    PoolStopped,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
