//! Worker configuration
//!
//! This module provides `WorkerConfig`, shared by every worker a pool spawns.

use super::constants::DEFAULT_CONSUME_TIMEOUT;
use crate::application::backoff::BackoffConfig;
use std::time::Duration;

/// Configuration for a worker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkerConfig {
    /// Upper bound on a single consume; keeps stop signals responsive
    pub consume_timeout: Duration,

    /// Backoff applied after failed consumes and failed processing
    pub backoff: BackoffConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            consume_timeout: DEFAULT_CONSUME_TIMEOUT,
            backoff: BackoffConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the consume timeout. `Duration::ZERO` is replaced by the default,
    /// since an unbounded consume would make the worker unstoppable.
    pub fn with_consume_timeout(mut self, timeout: Duration) -> Self {
        self.consume_timeout = if timeout.is_zero() {
            DEFAULT_CONSUME_TIMEOUT
        } else {
            timeout
        };
        self
    }

    /// Set the backoff parameters.
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }
}
