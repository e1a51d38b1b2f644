use std::{fs::File, io::Read, path::PathBuf};

use dsmr_fields::{FieldDefinition, FieldTable, FieldTableError};
use serde::Deserialize;

#[derive(thiserror::Error, Debug)]
pub enum FieldTableLoadError {
    #[error("failed to open field table '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read field table: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: invalid discovery flag '{value}' (expected 0, 1, true or false)")]
    InvalidFlag { line: u64, value: String },
    #[error(transparent)]
    Table(#[from] FieldTableError),
}

/// CSV replacement for the built-in DSMR 5.0 table.
///
/// Expected header columns (by name):
/// - key (OBIS reference)
/// - tag
/// - topic
/// - description
/// - unit (may be empty)
/// - icon
/// - discovery (0, 1, true or false)
pub struct FieldTableCsvFile {
    path: PathBuf,
}

#[derive(Deserialize)]
struct FieldRow {
    key: String,
    tag: String,
    topic: String,
    description: String,
    #[serde(default)]
    unit: String,
    icon: String,
    discovery: String,
}

fn parse_discovery_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

impl FieldTableCsvFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<FieldTable, FieldTableLoadError> {
        let file = File::open(&self.path).map_err(|source| FieldTableLoadError::Io {
            path: self.path.clone(),
            source,
        })?;
        read_field_table(file)
    }
}

pub fn read_field_table<R: Read>(reader: R) -> Result<FieldTable, FieldTableLoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut fields = Vec::new();
    for result in rdr.deserialize::<FieldRow>() {
        let row = result?;
        let discovery_enabled = match parse_discovery_flag(&row.discovery) {
            Some(flag) => flag,
            None => {
                // Header is line 1.
                let line = fields.len() as u64 + 2;
                return Err(FieldTableLoadError::InvalidFlag {
                    line,
                    value: row.discovery,
                });
            }
        };

        fields.push(FieldDefinition {
            key: row.key,
            tag: row.tag,
            topic: row.topic,
            description: row.description,
            unit: row.unit,
            icon: row.icon,
            discovery_enabled,
        });
    }

    let table = FieldTable::new(fields)?;
    tracing::info!(fields = table.len(), "loaded field table from CSV");
    Ok(table)
}
