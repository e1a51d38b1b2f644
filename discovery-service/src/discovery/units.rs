//! Physical unit to Home Assistant sensor class mapping.
//!
//! See <https://developers.home-assistant.io/docs/core/entity/sensor/#long-term-statistics>.

use serde::Serialize;

/// Units Home Assistant gets a device class for.
pub const HA_SUPPORTED_UNITS: &[&str] = &["kWh", "kW", "A", "V", "m3", "m\u{b3}"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Energy,
    Power,
    Current,
    Voltage,
    Gas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StateClass {
    Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorClass {
    pub device_class: DeviceClass,
    pub state_class: Option<StateClass>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("unsupported unit_of_measurement '{0}'")]
    Unsupported(String),
    #[error("unknown unit_of_measurement '{0}'")]
    Unmatched(String),
}

/// `m3` and `m³` are both in use for gas meters.
pub fn is_volume_unit(unit: &str) -> bool {
    matches!(unit, "m3" | "m\u{b3}")
}

pub fn classify_unit(unit: &str) -> Result<SensorClass, UnitError> {
    if !HA_SUPPORTED_UNITS.contains(&unit) {
        return Err(UnitError::Unsupported(unit.to_string()));
    }

    let (device_class, state_class) = match unit {
        "kWh" => (DeviceClass::Energy, Some(StateClass::Total)),
        "kW" => (DeviceClass::Power, None),
        "A" => (DeviceClass::Current, None),
        "V" => (DeviceClass::Voltage, None),
        u if is_volume_unit(u) => (DeviceClass::Gas, Some(StateClass::Total)),
        // Reached only when HA_SUPPORTED_UNITS grows without a rule here.
        other => return Err(UnitError::Unmatched(other.to_string())),
    };

    Ok(SensorClass {
        device_class,
        state_class,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_supported_unit() {
        let expected = [
            ("kWh", DeviceClass::Energy, Some(StateClass::Total)),
            ("kW", DeviceClass::Power, None),
            ("A", DeviceClass::Current, None),
            ("V", DeviceClass::Voltage, None),
            ("m3", DeviceClass::Gas, Some(StateClass::Total)),
            ("m\u{b3}", DeviceClass::Gas, Some(StateClass::Total)),
        ];

        for (unit, device_class, state_class) in expected {
            assert_eq!(
                classify_unit(unit),
                Ok(SensorClass {
                    device_class,
                    state_class
                }),
                "unit {unit}"
            );
        }
    }

    #[test]
    fn unknown_units_are_unsupported() {
        assert_eq!(classify_unit("W"), Err(UnitError::Unsupported("W".to_string())));
        assert_eq!(classify_unit("kwh"), Err(UnitError::Unsupported("kwh".to_string())));
        assert_eq!(classify_unit("s"), Err(UnitError::Unsupported("s".to_string())));
    }

    #[test]
    fn classification_is_stable() {
        assert_eq!(classify_unit("kW"), classify_unit("kW"));
        assert_eq!(classify_unit("Hz"), classify_unit("Hz"));
    }

    #[test]
    fn classes_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&DeviceClass::Energy).unwrap(), "\"energy\"");
        assert_eq!(serde_json::to_string(&StateClass::Total).unwrap(), "\"total\"");
    }
}
