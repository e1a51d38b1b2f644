//! Built-in field table for DSMR 5.0 (P1 port) telegrams.
//!
//! Gas is published by the parser in liters while the unit stays `m3`;
//! the discovery payload converts it back for Home Assistant.

use crate::domain::{FieldDefinition, FieldTable};

// key, tag, topic, description, unit, icon, discovery
const DSMR50: &[(&str, &str, &str, &str, &str, &str, bool)] = &[
    ("1-3:0.2.8", "dsmr_version", "version", "DSMR version", "", "mdi:numeric", false),
    ("0-0:1.0.0", "timestamp", "timestamp", "Telegram timestamp", "", "mdi:clock-outline", false),
    ("0-0:96.1.1", "equipment_id", "equipment_id", "Equipment identifier", "", "mdi:identifier", false),
    ("1-0:1.8.1", "el_consumed_t1", "el_consumed_t1", "Electricity consumed tariff 1", "kWh", "mdi:counter", true),
    ("1-0:1.8.2", "el_consumed_t2", "el_consumed_t2", "Electricity consumed tariff 2", "kWh", "mdi:counter", true),
    ("1-0:2.8.1", "el_returned_t1", "el_returned_t1", "Electricity returned tariff 1", "kWh", "mdi:counter", true),
    ("1-0:2.8.2", "el_returned_t2", "el_returned_t2", "Electricity returned tariff 2", "kWh", "mdi:counter", true),
    ("0-0:96.14.0", "tariff", "tariff", "Tariff indicator", "", "mdi:theme-light-dark", true),
    ("1-0:1.7.0", "p1_power", "power", "Power Usage", "kW", "mdi:flash", true),
    ("1-0:2.7.0", "p1_power_returned", "power_returned", "Power Returned", "kW", "mdi:flash-outline", true),
    ("0-0:96.7.21", "power_failures", "power_failures", "Power failures", "", "mdi:flash-off", true),
    ("0-0:96.7.9", "long_power_failures", "long_power_failures", "Long power failures", "", "mdi:flash-off", true),
    ("1-0:32.32.0", "voltage_sags_l1", "voltage_sags_l1", "Voltage sags L1", "", "mdi:arrow-down-bold", false),
    ("1-0:52.32.0", "voltage_sags_l2", "voltage_sags_l2", "Voltage sags L2", "", "mdi:arrow-down-bold", false),
    ("1-0:72.32.0", "voltage_sags_l3", "voltage_sags_l3", "Voltage sags L3", "", "mdi:arrow-down-bold", false),
    ("1-0:32.36.0", "voltage_swells_l1", "voltage_swells_l1", "Voltage swells L1", "", "mdi:arrow-up-bold", false),
    ("1-0:52.36.0", "voltage_swells_l2", "voltage_swells_l2", "Voltage swells L2", "", "mdi:arrow-up-bold", false),
    ("1-0:72.36.0", "voltage_swells_l3", "voltage_swells_l3", "Voltage swells L3", "", "mdi:arrow-up-bold", false),
    ("1-0:32.7.0", "voltage_l1", "voltage_l1", "Voltage L1", "V", "mdi:sine-wave", true),
    ("1-0:52.7.0", "voltage_l2", "voltage_l2", "Voltage L2", "V", "mdi:sine-wave", true),
    ("1-0:72.7.0", "voltage_l3", "voltage_l3", "Voltage L3", "V", "mdi:sine-wave", true),
    ("1-0:31.7.0", "current_l1", "current_l1", "Current L1", "A", "mdi:current-ac", true),
    ("1-0:51.7.0", "current_l2", "current_l2", "Current L2", "A", "mdi:current-ac", true),
    ("1-0:71.7.0", "current_l3", "current_l3", "Current L3", "A", "mdi:current-ac", true),
    ("1-0:21.7.0", "power_l1", "power_l1", "Power usage L1", "kW", "mdi:flash", true),
    ("1-0:41.7.0", "power_l2", "power_l2", "Power usage L2", "kW", "mdi:flash", true),
    ("1-0:61.7.0", "power_l3", "power_l3", "Power usage L3", "kW", "mdi:flash", true),
    ("1-0:22.7.0", "power_returned_l1", "power_returned_l1", "Power returned L1", "kW", "mdi:flash-outline", true),
    ("1-0:42.7.0", "power_returned_l2", "power_returned_l2", "Power returned L2", "kW", "mdi:flash-outline", true),
    ("1-0:62.7.0", "power_returned_l3", "power_returned_l3", "Power returned L3", "kW", "mdi:flash-outline", true),
    ("0-1:96.1.0", "gas_equipment_id", "gas_equipment_id", "Gas meter identifier", "", "mdi:identifier", false),
    ("0-1:24.2.1", "gas_consumed", "gas_consumed", "Gas consumed", "m3", "mdi:fire", true),
];

/// The DSMR 5.0 table, in telegram order.
pub fn dsmr50() -> FieldTable {
    let fields = DSMR50
        .iter()
        .map(|&(key, tag, topic, description, unit, icon, discovery)| {
            FieldDefinition::new(key, tag, topic, description, unit, icon, discovery)
        })
        .collect();

    FieldTable::new(fields).expect("built-in DSMR 5.0 table must have unique keys and tags")
}

impl FieldTable {
    pub fn dsmr50() -> Self {
        dsmr50()
    }
}
