//! Shared helpers for the Hopper integration tests

use std::future::Future;
use std::time::Duration;

/// Random queue name so tests sharing a broker never collide
pub fn random_queue() -> String {
    format!("test-{}", uuid::Uuid::new_v4())
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses
pub async fn wait_until<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
