use anyhow::Result;
use discovery_service::{
    config::AppConfig,
    load_field_table, metrics_server, observability,
    shutdown::shutdown,
    sinks::MqttSink,
    DiscoveryPublisher, PublisherSettings, VERSION,
};
use std::{sync::Arc, time::Duration};
use tokio_util::sync::CancellationToken;

/// Upper bound for flushing queued publishes after the publisher stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let table = Arc::new(load_field_table(&cfg.discovery)?);
    cfg.validate_for_table(&table)?;

    let (sink, eventloop) = MqttSink::connect(&cfg.mqtt);
    let sink = Arc::new(sink);
    let eventloop = tokio::spawn(eventloop.run());

    tracing::info!(
        version = VERSION,
        broker = %format!("{}:{}", cfg.mqtt.host, cfg.mqtt.port),
        prefix = %cfg.mqtt.topic_prefix,
        fields = table.len(),
        "starting Home Assistant discovery"
    );

    let cancel = CancellationToken::new();
    let publisher = DiscoveryPublisher::new(
        cancel.clone(),
        sink.clone(),
        table,
        PublisherSettings::from_config(&cfg.discovery, &cfg.mqtt.topic_prefix),
        VERSION,
    );
    let finished = CancellationToken::new();
    let publisher = {
        let finished = finished.clone();
        tokio::spawn(async move {
            let summary = publisher.run().await;
            finished.cancel();
            summary
        })
    };

    // A disabled publisher returns on its own after retracting.
    tokio::select! {
        _ = shutdown_signal() => tracing::info!("shutdown requested"),
        _ = finished.cancelled() => {}
    }

    let report = shutdown(&cancel, publisher, &sink, eventloop, DRAIN_TIMEOUT).await?;
    tracing::info!(
        bursts = report.summary.bursts,
        retractions = report.summary.retractions,
        drained = report.drained,
        "stopped"
    );

    Ok(())
}
