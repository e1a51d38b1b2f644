use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::task::JoinHandle;

use super::{DiscoverySink, SinkError};
use crate::config::MqttConfig;

fn qos_from_level(level: u8) -> QoS {
    match level {
        0 => QoS::AtMostOnce,
        1 => QoS::AtLeastOnce,
        _ => QoS::ExactlyOnce,
    }
}

pub struct MqttSink {
    client: AsyncClient,
    qos: QoS,
}

impl MqttSink {
    /// Creates the client and its event loop. Nothing is sent until
    /// [`MqttEventLoop::run`] is polling.
    pub fn connect(cfg: &MqttConfig) -> (Self, MqttEventLoop) {
        let mut options = MqttOptions::new(&cfg.client_id, &cfg.host, cfg.port);
        // Zero disables keep-alive.
        options.set_keep_alive(Duration::from_secs(cfg.keep_alive_secs));
        if let Some(user) = &cfg.username {
            options.set_credentials(user, cfg.password.as_deref().unwrap_or_default());
        }

        let (client, eventloop) = AsyncClient::new(options, cfg.request_capacity.max(1));

        let sink = Self {
            client,
            qos: qos_from_level(cfg.qos),
        };
        let eventloop = MqttEventLoop {
            eventloop,
            reconnect_backoff: Duration::from_millis(cfg.reconnect_backoff_ms),
        };
        (sink, eventloop)
    }

    /// Queues a DISCONNECT behind any pending publishes. Fails instead of
    /// waiting when the request queue is full.
    pub fn disconnect(&self) -> Result<(), SinkError> {
        self.client.try_disconnect().map_err(|_| SinkError::Closed)
    }

    /// Disconnects and waits at most `timeout` for the event loop to flush.
    /// Returns whether the event loop finished in time; if not it is aborted
    /// and whatever is still queued is lost.
    pub async fn close(&self, eventloop: JoinHandle<()>, timeout: Duration) -> bool {
        if let Err(e) = self.disconnect() {
            tracing::warn!(error = %e, "failed to queue MQTT disconnect");
        }

        let abort = eventloop.abort_handle();
        match tokio::time::timeout(timeout, eventloop).await {
            Ok(_) => true,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "MQTT event loop did not drain in time; pending messages dropped"
                );
                abort.abort();
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl DiscoverySink for MqttSink {
    async fn publish(&self, topic: &str, body: &str, retain: bool) -> Result<(), SinkError> {
        // try_publish so a stalled connection drops messages instead of blocking the caller.
        self.client
            .try_publish(topic, self.qos, retain, body.as_bytes().to_vec())
            .map_err(|e| SinkError::Rejected(e.to_string()))
    }
}

pub struct MqttEventLoop {
    eventloop: EventLoop,
    reconnect_backoff: Duration,
}

impl MqttEventLoop {
    /// Drives the connection until the outgoing DISCONNECT has been written.
    /// Connection errors are logged and polling resumes after the backoff,
    /// which makes rumqttc reconnect.
    pub async fn run(mut self) {
        loop {
            match self.eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    tracing::info!(code = ?ack.code, "connected to MQTT broker");
                }
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    tracing::info!("disconnected from MQTT broker");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        backoff_ms = self.reconnect_backoff.as_millis() as u64,
                        "MQTT connection error, reconnecting"
                    );
                    metrics::counter!("mqtt_connection_errors_total").increment(1);
                    tokio::time::sleep(self.reconnect_backoff).await;
                }
            }
        }
    }
}
