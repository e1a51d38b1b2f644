pub mod field_table_csv;

pub use field_table_csv::{FieldTableCsvFile, FieldTableLoadError};
