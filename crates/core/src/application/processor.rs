// Processing function contract

use crate::domain::Message;
use async_trait::async_trait;

/// Turns one consumed message into zero or more derived messages
///
/// Outputs are published to the worker's own queue before the input is
/// acknowledged. An `Err` (or a panic) nacks the input for redelivery.
#[async_trait]
pub trait Processor: Send + Sync {
    async fn process(&self, message: Message) -> anyhow::Result<Vec<Message>>;
}

#[async_trait]
impl<F> Processor for F
where
    F: Fn(Message) -> anyhow::Result<Vec<Message>> + Send + Sync,
{
    async fn process(&self, message: Message) -> anyhow::Result<Vec<Message>> {
        self(message)
    }
}

/// Wrap a synchronous closure as a `Processor`
///
/// Exists so closure argument and return types can be inferred:
/// ```text
/// let pool = Pool::new(broker, "jobs", processor::from_fn(|msg| {
///     println!("{:?}", msg);
///     Ok(vec![])
/// }));
/// ```
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(Message) -> anyhow::Result<Vec<Message>> + Send + Sync + 'static,
{
    f
}
