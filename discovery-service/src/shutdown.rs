use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{discovery::RunSummary, sinks::MqttSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub summary: RunSummary,
    /// Whether the event loop flushed the DISCONNECT within the drain timeout.
    pub drained: bool,
}

/// Stops the publisher (which sends its retractions), then queues the
/// DISCONNECT behind them and waits at most `drain_timeout` for the event loop.
pub async fn shutdown(
    cancel: &CancellationToken,
    publisher: JoinHandle<RunSummary>,
    sink: &MqttSink,
    eventloop: JoinHandle<()>,
    drain_timeout: Duration,
) -> Result<ShutdownReport, JoinError> {
    cancel.cancel();
    let summary = publisher.await?;
    tracing::debug!(?summary, "publisher finished");

    let drained = sink.close(eventloop, drain_timeout).await;
    Ok(ShutdownReport { summary, drained })
}
