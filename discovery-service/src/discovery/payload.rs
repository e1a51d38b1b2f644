//! Home Assistant MQTT discovery payloads.
//!
//! Reference: <https://www.home-assistant.io/integrations/sensor.mqtt/>

use dsmr_fields::{FieldDefinition, FieldTable, STATUS_UNIQUE_ID};
use serde::Serialize;

use super::units::{classify_unit, is_volume_unit, DeviceClass, StateClass, UnitError};

pub const DEVICE_IDENTIFIER: &str = "dsmr2mqtt";
pub const DEVICE_NAME: &str = "HA dsmr reader";
pub const DEVICE_MODEL: &str = "P1 USB/dsmr-mqtt";
pub const DEVICE_MANUFACTURER: &str = "https://github.com/smartathome/dsmr2mqtt";

const STATUS_NAME: &str = "Status";
const STATUS_ICON: &str = "mdi:home-automation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Device {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    pub identifiers: Vec<String>,
}

impl Device {
    /// Full descriptor, carried by the status entity only.
    pub fn descriptor(version: &str) -> Self {
        Self {
            name: Some(DEVICE_NAME.to_string()),
            sw_version: Some(version.to_string()),
            model: Some(DEVICE_MODEL.to_string()),
            manufacturer: Some(DEVICE_MANUFACTURER.to_string()),
            identifiers: vec![DEVICE_IDENTIFIER.to_string()],
        }
    }

    /// Reference to the device by identifier.
    pub fn reference() -> Self {
        Self {
            name: None,
            sw_version: None,
            model: None,
            manufacturer: None,
            identifiers: vec![DEVICE_IDENTIFIER.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPayload {
    pub name: String,
    pub unique_id: String,
    pub state_topic: String,
    pub icon: String,
    pub device: Device,
}

impl StatusPayload {
    pub fn new(topic_prefix: &str, version: &str) -> Self {
        Self {
            name: STATUS_NAME.to_string(),
            unique_id: STATUS_UNIQUE_ID.to_string(),
            state_topic: format!("{topic_prefix}/status"),
            icon: STATUS_ICON.to_string(),
            device: Device::descriptor(version),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorPayload {
    pub unique_id: String,
    pub state_topic: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    pub value_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<DeviceClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_class: Option<StateClass>,
    pub icon: String,
    pub device: Device,
}

impl SensorPayload {
    /// Builds the sensor entity for `field`. A unit without a class mapping
    /// still yields a payload; the mapping error is handed back as a warning.
    pub fn from_field(field: &FieldDefinition, topic_prefix: &str) -> (Self, Option<UnitError>) {
        let unit = field.has_unit().then(|| field.unit.clone());

        let value_template = if is_volume_unit(&field.unit) {
            // Upstream publishes liters, Home Assistant expects m3.
            volume_template(&field.tag)
        } else {
            direct_template(&field.tag)
        };

        let (device_class, state_class, warning) = match unit.as_deref().map(classify_unit) {
            None => (None, None, None),
            Some(Ok(class)) => (Some(class.device_class), class.state_class, None),
            Some(Err(e)) => (None, None, Some(e)),
        };

        let payload = Self {
            unique_id: field.tag.clone(),
            state_topic: format!("{topic_prefix}/{}", field.topic),
            name: field.description.clone(),
            unit_of_measurement: unit,
            value_template,
            device_class,
            state_class,
            icon: field.icon.clone(),
            device: Device::reference(),
        };

        (payload, warning)
    }
}

fn direct_template(tag: &str) -> String {
    format!("{{{{ value_json.{tag} }}}}")
}

fn volume_template(tag: &str) -> String {
    format!("{{{{value_json.{tag}|float/1000|round(0)}}}}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DiscoveryPayload {
    Status(StatusPayload),
    Sensor(SensorPayload),
}

impl DiscoveryPayload {
    pub fn unique_id(&self) -> &str {
        match self {
            Self::Status(p) => &p.unique_id,
            Self::Sensor(p) => &p.unique_id,
        }
    }

    /// `homeassistant/sensor/<prefix>/<unique_id>/config`
    pub fn config_topic(&self, topic_prefix: &str) -> String {
        format!("homeassistant/sensor/{topic_prefix}/{}/config", self.unique_id())
    }

    /// Compact JSON body.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuiltPayloads {
    /// Status entity first, then one sensor per discoverable field in table order.
    pub payloads: Vec<DiscoveryPayload>,
    pub warnings: Vec<UnitError>,
}

/// Builds the discovery set for `table`. Pure apart from logging and metrics.
pub fn build_payloads(table: &FieldTable, topic_prefix: &str, version: &str) -> BuiltPayloads {
    let mut built = BuiltPayloads {
        payloads: Vec::with_capacity(table.len() + 1),
        warnings: Vec::new(),
    };

    built
        .payloads
        .push(DiscoveryPayload::Status(StatusPayload::new(topic_prefix, version)));

    for field in table.discoverable() {
        let (sensor, warning) = SensorPayload::from_field(field, topic_prefix);
        tracing::debug!(key = %field.key, unique_id = %sensor.unique_id, "built discovery payload");

        if let Some(w) = warning {
            tracing::warn!(key = %field.key, tag = %field.tag, error = %w, "no device class for unit");
            metrics::counter!("discovery_unit_warnings_total").increment(1);
            built.warnings.push(w);
        }

        built.payloads.push(DiscoveryPayload::Sensor(sensor));
    }

    built
}
