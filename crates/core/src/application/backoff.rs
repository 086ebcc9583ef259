// Retry backoff for the worker loop
use crate::application::worker::constants::*;
use rand::Rng;
use std::time::Duration;

/// Exponential backoff parameters
///
/// delay(n) = min(initial * multiplier^n, max_interval) * (1 +/- randomization_factor)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    pub initial_interval: Duration,
    pub multiplier: f64,
    /// Jitter as a fraction of the current interval (0.0 disables jitter)
    pub randomization_factor: f64,
    pub max_interval: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_interval: DEFAULT_BACKOFF_INITIAL_INTERVAL,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            randomization_factor: DEFAULT_BACKOFF_RANDOMIZATION_FACTOR,
            max_interval: DEFAULT_BACKOFF_MAX_INTERVAL,
        }
    }
}

impl BackoffConfig {
    /// Fixed delay with no growth and no jitter
    pub fn constant(interval: Duration) -> Self {
        Self {
            initial_interval: interval,
            multiplier: 1.0,
            randomization_factor: 0.0,
            max_interval: interval,
        }
    }
}

/// Backoff state owned by one worker
///
/// Delays grow across consecutive failures until `reset` is called.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    current_interval: Duration,
    attempts: u32,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            current_interval: config.initial_interval.min(config.max_interval),
            config,
            attempts: 0,
        }
    }

    /// Delay to apply before the next retry; advances the interval
    pub fn next_backoff(&mut self) -> Duration {
        let delay = randomize(self.current_interval, self.config.randomization_factor);

        let next = self.current_interval.as_secs_f64() * self.config.multiplier.max(1.0);
        self.current_interval = Duration::try_from_secs_f64(next)
            .unwrap_or(self.config.max_interval)
            .min(self.config.max_interval);
        self.attempts = self.attempts.saturating_add(1);

        delay
    }

    /// Forget previous failures
    pub fn reset(&mut self) {
        self.current_interval = self.config.initial_interval.min(self.config.max_interval);
        self.attempts = 0;
    }

    /// Consecutive failures since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }
}

fn randomize(interval: Duration, factor: f64) -> Duration {
    let factor = factor.clamp(0.0, 1.0);
    if factor == 0.0 || interval.is_zero() {
        return interval;
    }

    let secs = interval.as_secs_f64();
    let delta = secs * factor;
    let jittered = rand::thread_rng().gen_range((secs - delta)..=(secs + delta));
    Duration::try_from_secs_f64(jittered).unwrap_or(interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> BackoffConfig {
        BackoffConfig {
            initial_interval: Duration::from_millis(100),
            multiplier: 2.0,
            randomization_factor: 0.0,
            max_interval: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_delays_grow_exponentially() {
        let mut backoff = ExponentialBackoff::new(no_jitter());
        assert_eq!(backoff.next_backoff(), Duration::from_millis(100));
        assert_eq!(backoff.next_backoff(), Duration::from_millis(200));
        assert_eq!(backoff.next_backoff(), Duration::from_millis(400));
        assert_eq!(backoff.attempts(), 3);
    }

    #[test]
    fn test_interval_is_capped() {
        let mut backoff = ExponentialBackoff::new(no_jitter());
        for _ in 0..10 {
            backoff.next_backoff();
        }
        assert_eq!(backoff.current_interval(), Duration::from_millis(500));
        assert_eq!(backoff.next_backoff(), Duration::from_millis(500));
    }

    #[test]
    fn test_reset_restarts_from_initial() {
        let mut backoff = ExponentialBackoff::new(no_jitter());
        backoff.next_backoff();
        backoff.next_backoff();

        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_backoff(), Duration::from_millis(100));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let mut backoff = ExponentialBackoff::new(BackoffConfig {
            randomization_factor: 0.5,
            ..no_jitter()
        });

        for _ in 0..50 {
            backoff.reset();
            let delay = backoff.next_backoff();
            assert!(delay >= Duration::from_millis(50), "delay too short: {:?}", delay);
            assert!(delay <= Duration::from_millis(150), "delay too long: {:?}", delay);
        }
    }

    #[test]
    fn test_constant_backoff() {
        let mut backoff = ExponentialBackoff::new(BackoffConfig::constant(Duration::from_millis(5)));
        for _ in 0..5 {
            assert_eq!(backoff.next_backoff(), Duration::from_millis(5));
        }
    }

    #[test]
    fn test_default_matches_constants() {
        let config = BackoffConfig::default();
        assert_eq!(config.initial_interval, DEFAULT_BACKOFF_INITIAL_INTERVAL);
        assert_eq!(config.max_interval, DEFAULT_BACKOFF_MAX_INTERVAL);
        assert!(config.multiplier > 1.0);
    }
}
