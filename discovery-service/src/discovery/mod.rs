pub mod payload;
pub mod publisher;
pub mod units;

pub use payload::{build_payloads, BuiltPayloads, DiscoveryPayload, SensorPayload, StatusPayload};
pub use publisher::{DiscoveryPublisher, PublisherSettings, RunSummary, IDLE_QUANTUM};
pub use units::{classify_unit, DeviceClass, SensorClass, StateClass, UnitError};
