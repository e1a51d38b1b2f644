pub mod mqtt;

pub use mqtt::{MqttEventLoop, MqttSink};

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("publish rejected: {0}")]
    Rejected(String),
    #[error("sink closed")]
    Closed,
}

/// Fire-and-forget publish capability. Implementations own their connection
/// handling; callers never retry.
#[async_trait::async_trait]
pub trait DiscoverySink: Send + Sync {
    async fn publish(&self, topic: &str, body: &str, retain: bool) -> Result<(), SinkError>;
}
