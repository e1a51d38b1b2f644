mod field_definition;
mod field_table;

pub use field_definition::FieldDefinition;
pub use field_table::{FieldTable, FieldTableError, STATUS_UNIQUE_ID};
