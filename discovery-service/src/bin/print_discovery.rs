use anyhow::Result;
use discovery_service::{build_payloads, config::AppConfig, load_field_table, observability, VERSION};
use std::io::{self, Write};

/// Prints `<config topic>\t<json>` for every discovery payload, without a broker.
fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let table = load_field_table(&cfg.discovery)?;
    let prefix = &cfg.mqtt.topic_prefix;

    let built = build_payloads(&table, prefix, VERSION);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for payload in &built.payloads {
        writeln!(out, "{}\t{}", payload.config_topic(prefix), payload.to_json()?)?;
    }

    if !built.warnings.is_empty() {
        tracing::warn!(count = built.warnings.len(), "some units have no Home Assistant device class");
    }

    Ok(())
}
