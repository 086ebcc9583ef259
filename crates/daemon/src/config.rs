//! Daemon configuration, read from `HOPPER_*` environment variables

use hopper_core::application::WorkerConfig;
use hopper_core::domain::validate_queue_name;
use hopper_core::AppError;
use std::time::Duration;

use crate::telemetry::LogFormat;

const DEFAULT_QUEUE: &str = "default";
const DEFAULT_WORKERS: usize = 4;
const DEFAULT_CONSUME_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    pub queue: String,
    pub workers: usize,
    pub consume_timeout: Duration,
    /// Published once at startup when set
    pub seed: Option<String>,
    pub log_format: LogFormat,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            queue: DEFAULT_QUEUE.to_string(),
            workers: DEFAULT_WORKERS,
            consume_timeout: Duration::from_millis(DEFAULT_CONSUME_TIMEOUT_MS),
            seed: None,
            log_format: LogFormat::default(),
        }
    }
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or empty values keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(queue) = get("HOPPER_QUEUE") {
            validate_queue_name(&queue)
                .map_err(|e| AppError::Config(format!("HOPPER_QUEUE: {}", e)))?;
            config.queue = queue;
        }

        if let Some(workers) = get("HOPPER_WORKERS") {
            config.workers = parse_number("HOPPER_WORKERS", &workers)?;
        }

        if let Some(ms) = get("HOPPER_CONSUME_TIMEOUT_MS") {
            let ms: u64 = parse_number("HOPPER_CONSUME_TIMEOUT_MS", &ms)?;
            if ms == 0 {
                return Err(AppError::Config(
                    "HOPPER_CONSUME_TIMEOUT_MS must be greater than zero".to_string(),
                ));
            }
            config.consume_timeout = Duration::from_millis(ms);
        }

        config.seed = get("HOPPER_SEED");

        if let Some(format) = get("HOPPER_LOG_FORMAT") {
            config.log_format = LogFormat::parse(&format);
        }

        Ok(config)
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::new().with_consume_timeout(self.consume_timeout)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("{}={:?}: {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = DaemonConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DaemonConfig::default());
        assert_eq!(config.queue, "default");
        assert_eq!(config.workers, 4);
        assert_eq!(config.consume_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_reads_every_variable() {
        let config = DaemonConfig::from_lookup(lookup(&[
            ("HOPPER_QUEUE", "words"),
            ("HOPPER_WORKERS", "12"),
            ("HOPPER_CONSUME_TIMEOUT_MS", "250"),
            ("HOPPER_SEED", "the quick brown fox"),
            ("HOPPER_LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.queue, "words");
        assert_eq!(config.workers, 12);
        assert_eq!(config.consume_timeout, Duration::from_millis(250));
        assert_eq!(config.seed.as_deref(), Some("the quick brown fox"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.worker_config().consume_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_empty_values_keep_defaults() {
        let config =
            DaemonConfig::from_lookup(lookup(&[("HOPPER_WORKERS", ""), ("HOPPER_SEED", "  ")]))
                .unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        for vars in [
            [("HOPPER_WORKERS", "many")],
            [("HOPPER_WORKERS", "-3")],
            [("HOPPER_CONSUME_TIMEOUT_MS", "0")],
            [("HOPPER_QUEUE", "no spaces")],
        ] {
            let err = DaemonConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, AppError::Config(_)), "{:?}", vars);
        }
    }
}
