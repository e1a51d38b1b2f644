use std::{sync::Arc, time::Duration};

use dsmr_fields::FieldTable;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::payload::{build_payloads, DiscoveryPayload};
use crate::{config::DiscoveryConfig, sinks::DiscoverySink};

/// Wait between schedule checks; bounds cancellation latency.
pub const IDLE_QUANTUM: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct PublisherSettings {
    pub topic_prefix: String,
    pub interval: Duration,
    pub enabled: bool,
    pub delete_on_exit: bool,
}

impl PublisherSettings {
    pub fn from_config(cfg: &DiscoveryConfig, topic_prefix: &str) -> Self {
        Self {
            topic_prefix: topic_prefix.to_string(),
            interval: cfg.interval(),
            enabled: cfg.enabled,
            delete_on_exit: cfg.delete_on_exit,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub bursts: u64,
    pub retractions: u64,
}

/// Periodically announces every discoverable field to Home Assistant.
pub struct DiscoveryPublisher<K> {
    cancel: CancellationToken,
    sink: Arc<K>,
    table: Arc<FieldTable>,
    settings: PublisherSettings,
    version: String,
    last_published: Option<Instant>,
}

impl<K> DiscoveryPublisher<K>
where
    K: DiscoverySink + 'static,
{
    pub fn new(
        cancel: CancellationToken,
        sink: Arc<K>,
        table: Arc<FieldTable>,
        settings: PublisherSettings,
        version: impl Into<String>,
    ) -> Self {
        Self {
            cancel,
            sink,
            table,
            settings,
            version: version.into(),
            last_published: None,
        }
    }

    /// Runs until the cancellation token fires, then optionally retracts
    /// every entity. With publishing disabled only the retraction step runs.
    pub async fn run(mut self) -> RunSummary {
        let built = build_payloads(&self.table, &self.settings.topic_prefix, &self.version);
        let payloads = built.payloads;
        let mut summary = RunSummary::default();

        tracing::info!(
            entities = payloads.len(),
            unit_warnings = built.warnings.len(),
            interval_secs = self.settings.interval.as_secs_f64(),
            enabled = self.settings.enabled,
            "discovery publisher started"
        );

        if self.settings.enabled {
            while !self.cancel.is_cancelled() {
                if self.is_due() {
                    self.publish_all(&payloads).await;
                    self.last_published = Some(Instant::now());
                    summary.bursts += 1;
                } else {
                    tokio::select! {
                        _ = self.cancel.cancelled() => {}
                        _ = tokio::time::sleep(IDLE_QUANTUM) => {}
                    }
                }
            }
        }

        if self.settings.delete_on_exit {
            summary.retractions = self.retract_all(&payloads).await;
        }

        tracing::info!(
            bursts = summary.bursts,
            retractions = summary.retractions,
            "discovery publisher stopped"
        );
        summary
    }

    fn is_due(&self) -> bool {
        match self.last_published {
            None => true,
            Some(at) => at.elapsed() > self.settings.interval,
        }
    }

    async fn publish_all(&self, payloads: &[DiscoveryPayload]) {
        let mut published = 0usize;
        for payload in payloads {
            let topic = payload.config_topic(&self.settings.topic_prefix);
            let body = match payload.to_json() {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!(topic = %topic, error = %e, "failed to encode discovery payload");
                    continue;
                }
            };

            match self.sink.publish(&topic, &body, true).await {
                Ok(()) => {
                    published += 1;
                    metrics::counter!("discovery_published_total").increment(1);
                }
                Err(e) => {
                    tracing::warn!(topic = %topic, error = %e, "discovery publish failed");
                    metrics::counter!("discovery_publish_errors_total").increment(1);
                }
            }
        }

        metrics::counter!("discovery_bursts_total").increment(1);
        tracing::debug!(published, total = payloads.len(), "published discovery burst");
    }

    /// Empty, non-retained body per config topic: Home Assistant drops the entity.
    async fn retract_all(&self, payloads: &[DiscoveryPayload]) -> u64 {
        let mut retracted = 0;
        for payload in payloads {
            let topic = payload.config_topic(&self.settings.topic_prefix);
            match self.sink.publish(&topic, "", false).await {
                Ok(()) => {
                    retracted += 1;
                    metrics::counter!("discovery_retractions_total").increment(1);
                }
                Err(e) => {
                    tracing::warn!(topic = %topic, error = %e, "discovery retraction failed");
                    metrics::counter!("discovery_publish_errors_total").increment(1);
                }
            }
        }
        tracing::info!(retracted, "removed discovery configuration");
        retracted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::SinkError;
    use dsmr_fields::FieldDefinition;
    use std::sync::Mutex;

    const STATUS_TOPIC: &str = "homeassistant/sensor/dsmr/dsmr-device/config";

    #[derive(Debug, Clone)]
    struct Published {
        topic: String,
        body: String,
        retain: bool,
        at: Instant,
    }

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<Published>>,
        fail: bool,
    }

    impl RecordingSink {
        fn failing() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn take(&self) -> Vec<Published> {
            std::mem::take(&mut *self.published.lock().unwrap())
        }
    }

    #[async_trait::async_trait]
    impl DiscoverySink for RecordingSink {
        async fn publish(&self, topic: &str, body: &str, retain: bool) -> Result<(), SinkError> {
            self.published.lock().unwrap().push(Published {
                topic: topic.to_string(),
                body: body.to_string(),
                retain,
                at: Instant::now(),
            });
            if self.fail {
                Err(SinkError::Rejected("offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn table() -> Arc<FieldTable> {
        Arc::new(
            FieldTable::new(vec![
                FieldDefinition::new("1-0:1.7.0", "p1_power", "power", "Power Usage", "kW", "mdi:flash", true),
                FieldDefinition::new("0-0:96.14.0", "tariff", "tariff", "Tariff", "", "mdi:counter", false),
                FieldDefinition::new("0-1:24.2.1", "gas", "gas", "Gas", "m3", "mdi:fire", true),
            ])
            .unwrap(),
        )
    }

    fn settings(enabled: bool, delete_on_exit: bool) -> PublisherSettings {
        PublisherSettings {
            topic_prefix: "dsmr".to_string(),
            interval: Duration::from_secs(300),
            enabled,
            delete_on_exit,
        }
    }

    fn publisher(
        sink: &Arc<RecordingSink>,
        cancel: &CancellationToken,
        settings: PublisherSettings,
    ) -> DiscoveryPublisher<RecordingSink> {
        DiscoveryPublisher::new(cancel.clone(), sink.clone(), table(), settings, "1.0.0")
    }

    #[tokio::test(start_paused = true)]
    async fn first_burst_is_immediate_and_retained() {
        let sink = Arc::new(RecordingSink::default());
        let cancel = CancellationToken::new();
        let start = Instant::now();
        let handle = tokio::spawn(publisher(&sink, &cancel, settings(true, false)).run());

        tokio::time::sleep(Duration::from_secs(1)).await;
        cancel.cancel();
        let summary = handle.await.unwrap();

        assert_eq!(summary, RunSummary { bursts: 1, retractions: 0 });

        let published = sink.take();
        let topics: Vec<&str> = published.iter().map(|p| p.topic.as_str()).collect();
        assert_eq!(
            topics,
            vec![
                STATUS_TOPIC,
                "homeassistant/sensor/dsmr/p1_power/config",
                "homeassistant/sensor/dsmr/gas/config",
            ]
        );
        assert!(published.iter().all(|p| p.retain && !p.body.is_empty()));
        assert!(published.iter().all(|p| p.at == start));
        assert!(published[2].body.contains("float/1000|round(0)"));
    }

    #[tokio::test(start_paused = true)]
    async fn bursts_are_at_least_one_interval_apart() {
        let sink = Arc::new(RecordingSink::default());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(publisher(&sink, &cancel, settings(true, false)).run());

        tokio::time::sleep(Duration::from_secs(700)).await;
        cancel.cancel();
        let summary = handle.await.unwrap();
        assert_eq!(summary.bursts, 3);

        let bursts: Vec<Instant> = sink
            .take()
            .into_iter()
            .filter(|p| p.topic == STATUS_TOPIC)
            .map(|p| p.at)
            .collect();
        assert_eq!(bursts.len(), 3);
        for pair in bursts.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_secs(300), "gap {gap:?}");
            assert!(gap <= Duration::from_secs(300) + IDLE_QUANTUM, "gap {gap:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_within_one_quantum() {
        let sink = Arc::new(RecordingSink::default());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(publisher(&sink, &cancel, settings(true, false)).run());

        tokio::time::sleep(Duration::from_secs(10)).await;
        let cancelled_at = Instant::now();
        cancel.cancel();
        handle.await.unwrap();

        assert!(Instant::now() - cancelled_at <= IDLE_QUANTUM);
        assert_eq!(sink.take().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_publishes_nothing() {
        let sink = Arc::new(RecordingSink::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let summary = publisher(&sink, &cancel, settings(true, false)).run().await;
        assert_eq!(summary, RunSummary::default());
        assert!(sink.take().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delete_on_exit_sends_one_empty_message_per_entity() {
        let sink = Arc::new(RecordingSink::default());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(publisher(&sink, &cancel, settings(true, true)).run());

        tokio::time::sleep(Duration::from_secs(2)).await;
        cancel.cancel();
        let summary = handle.await.unwrap();
        assert_eq!(summary, RunSummary { bursts: 1, retractions: 3 });

        let published = sink.take();
        let (announced, retracted) = published.split_at(3);
        assert!(announced.iter().all(|p| p.retain));
        assert!(retracted.iter().all(|p| p.body.is_empty() && !p.retain));

        let announced_topics: Vec<&str> = announced.iter().map(|p| p.topic.as_str()).collect();
        let retracted_topics: Vec<&str> = retracted.iter().map(|p| p.topic.as_str()).collect();
        assert_eq!(announced_topics, retracted_topics);
    }

    #[tokio::test(start_paused = true)]
    async fn without_delete_on_exit_nothing_is_retracted() {
        let sink = Arc::new(RecordingSink::default());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(publisher(&sink, &cancel, settings(true, false)).run());

        tokio::time::sleep(Duration::from_secs(2)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(sink.take().iter().all(|p| !p.body.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_publishing_only_retracts() {
        let sink = Arc::new(RecordingSink::default());
        let cancel = CancellationToken::new();

        let summary = publisher(&sink, &cancel, settings(false, true)).run().await;
        assert_eq!(summary, RunSummary { bursts: 0, retractions: 3 });
        assert!(sink.take().iter().all(|p| p.body.is_empty() && !p.retain));

        let summary = publisher(&sink, &cancel, settings(false, false)).run().await;
        assert_eq!(summary, RunSummary::default());
        assert!(sink.take().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_publishes_do_not_stop_the_schedule() {
        let sink = Arc::new(RecordingSink::failing());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(publisher(&sink, &cancel, settings(true, true)).run());

        tokio::time::sleep(Duration::from_secs(400)).await;
        cancel.cancel();
        let summary = handle.await.unwrap();

        assert_eq!(summary.bursts, 2);
        assert_eq!(summary.retractions, 0);
        // Two bursts plus one retraction attempt per entity.
        assert_eq!(sink.take().len(), 9);
    }

    #[test]
    fn settings_derive_interval_from_rate() {
        let cfg = DiscoveryConfig {
            rate_per_hour: 4,
            delete_on_exit: true,
            ..DiscoveryConfig::default()
        };
        let s = PublisherSettings::from_config(&cfg, "dsmr");
        assert_eq!(s.interval, Duration::from_secs(900));
        assert!(s.enabled);
        assert!(s.delete_on_exit);
        assert_eq!(s.topic_prefix, "dsmr");
    }
}
