pub mod config;
pub mod discovery;
pub mod metrics_server;
pub mod observability;
pub mod shutdown;
pub mod sinks;
pub mod sources;

pub use discovery::{build_payloads, DiscoveryPayload, DiscoveryPublisher, PublisherSettings};

use anyhow::Result;
use dsmr_fields::FieldTable;

/// Version announced in the device descriptor.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The configured CSV table, or the built-in DSMR 5.0 table.
pub fn load_field_table(cfg: &config::DiscoveryConfig) -> Result<FieldTable> {
    match &cfg.field_table_path {
        Some(path) => Ok(sources::FieldTableCsvFile::new(path).load()?),
        None => Ok(FieldTable::dsmr50()),
    }
}
