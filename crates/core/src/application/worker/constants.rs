// Worker constants (No magic values)
use std::time::Duration;

/// How long a worker waits for a message before backing off (1s)
///
/// Stop signals are only observed between consumes, so this also bounds how
/// long a stopping worker can linger.
pub const DEFAULT_CONSUME_TIMEOUT: Duration = Duration::from_secs(1);

/// First backoff delay after a failed consume or process (500ms)
pub const DEFAULT_BACKOFF_INITIAL_INTERVAL: Duration = Duration::from_millis(500);

/// Growth factor between consecutive backoff delays
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.5;

/// Jitter applied to each delay: +/- 50% of the current interval
pub const DEFAULT_BACKOFF_RANDOMIZATION_FACTOR: f64 = 0.5;

/// Ceiling for the (pre-jitter) backoff interval (60s)
pub const DEFAULT_BACKOFF_MAX_INTERVAL: Duration = Duration::from_secs(60);
