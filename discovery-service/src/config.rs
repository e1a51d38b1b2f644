use dsmr_fields::FieldTable;
use serde::Deserialize;
use std::{fs, path::PathBuf, time::Duration};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("discovery.rate_per_hour must be greater than zero")]
    ZeroRate,
    #[error("mqtt.topic_prefix must be non-empty and must not end with '/'")]
    InvalidTopicPrefix,
    #[error("mqtt.topic_prefix must not contain MQTT wildcards '+' or '#'")]
    WildcardTopicPrefix,
    #[error("mqtt.qos must be 0, 1 or 2 (got {0})")]
    InvalidQos(u8),
    #[error("mqtt.request_capacity {capacity} cannot hold a discovery burst of {entities} entities")]
    RequestCapacityTooSmall { capacity: usize, entities: usize },
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "dsmr-discovery".to_string()
}

fn default_keep_alive_secs() -> u64 {
    60
}

fn default_topic_prefix() -> String {
    "dsmr".to_string()
}

fn default_qos() -> u8 {
    1
}

fn default_request_capacity() -> usize {
    100
}

fn default_reconnect_backoff_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

fn default_rate_per_hour() -> u32 {
    12
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    #[serde(default = "default_qos")]
    pub qos: u8,
    /// Capacity of the client request queue. Publishes beyond it are dropped.
    #[serde(default = "default_request_capacity")]
    pub request_capacity: usize,
    #[serde(default = "default_reconnect_backoff_ms")]
    pub reconnect_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Discovery bursts per hour.
    #[serde(default = "default_rate_per_hour")]
    pub rate_per_hour: u32,
    #[serde(default)]
    pub delete_on_exit: bool,
    /// CSV file replacing the built-in DSMR 5.0 table.
    pub field_table_path: Option<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_per_hour: default_rate_per_hour(),
            delete_on_exit: false,
            field_table_path: None,
        }
    }
}

impl DiscoveryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(3600.0 / f64::from(self.rate_per_hour.max(1)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("DSMR_DISCOVERY_CONFIG").unwrap_or_else(|_| "dsmr-discovery.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config file '{path}': {e}"))?;
        let cfg = Self::from_toml(&contents)?;
        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.rate_per_hour == 0 {
            return Err(ConfigError::ZeroRate);
        }
        let prefix = &self.mqtt.topic_prefix;
        if prefix.is_empty() || prefix.ends_with('/') {
            return Err(ConfigError::InvalidTopicPrefix);
        }
        if prefix.contains(['+', '#']) {
            return Err(ConfigError::WildcardTopicPrefix);
        }
        if self.mqtt.qos > 2 {
            return Err(ConfigError::InvalidQos(self.mqtt.qos));
        }
        Ok(())
    }

    /// A whole burst (status entity plus every discoverable field) is queued
    /// before the client connects, so the request queue must hold it.
    pub fn validate_for_table(&self, table: &FieldTable) -> Result<(), ConfigError> {
        let entities = table.discoverable().count() + 1;
        if self.mqtt.request_capacity < entities {
            return Err(ConfigError::RequestCapacityTooSmall {
                capacity: self.mqtt.request_capacity,
                entities,
            });
        }
        Ok(())
    }
}
