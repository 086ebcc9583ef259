// Queue Domain Model

use super::error::{DomainError, Result};

/// Longest accepted queue name (bytes)
pub const MAX_QUEUE_NAME_LEN: usize = 128;

/// Validate a queue name before a backend hands out handles for it
///
/// Names must be non-empty, at most `MAX_QUEUE_NAME_LEN` bytes and use only
/// ASCII alphanumerics or `_ - . :`.
pub fn validate_queue_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DomainError::InvalidQueueName(
            "queue name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_QUEUE_NAME_LEN {
        return Err(DomainError::InvalidQueueName(format!(
            "queue name too long ({} > {})",
            name.len(),
            MAX_QUEUE_NAME_LEN
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
    {
        return Err(DomainError::InvalidQueueName(format!(
            "queue name must be alphanumeric (with _ - . :): {}",
            name
        )));
    }

    Ok(())
}
