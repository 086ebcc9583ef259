// Worker counters shared by every worker of one pool

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Per-pool counters
///
/// Owned by a `Pool` (or a standalone `Worker`) and shared with its workers;
/// never process-global.
#[derive(Debug, Default)]
pub struct WorkerStats {
    idle_nanos: AtomicU64,
    processed: AtomicU64,
    failed: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backoff time accumulated since a worker last received a message
    pub fn time_since_work(&self) -> Duration {
        Duration::from_nanos(self.idle_nanos.load(Ordering::Relaxed))
    }

    /// Messages processed and acknowledged
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Processing attempts that ended in a nack
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub(crate) fn add_idle(&self, delay: Duration) {
        let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .idle_nanos
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_add(nanos))
            });
    }

    pub(crate) fn reset_idle(&self) {
        self.idle_nanos.store(0, Ordering::Relaxed);
    }

    pub(crate) fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_accumulates_and_resets() {
        let stats = WorkerStats::new();
        stats.add_idle(Duration::from_millis(500));
        stats.add_idle(Duration::from_millis(750));
        assert_eq!(stats.time_since_work(), Duration::from_millis(1250));

        stats.reset_idle();
        assert_eq!(stats.time_since_work(), Duration::ZERO);
    }

    #[test]
    fn test_idle_saturates() {
        let stats = WorkerStats::new();
        stats.add_idle(Duration::MAX);
        stats.add_idle(Duration::from_secs(1));
        assert_eq!(stats.time_since_work(), Duration::from_nanos(u64::MAX));
    }
}
