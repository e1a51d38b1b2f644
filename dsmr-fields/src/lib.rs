pub mod domain;
pub mod dsmr50;

pub use domain::{FieldDefinition, FieldTable, FieldTableError, STATUS_UNIQUE_ID};
