use std::collections::HashSet;

use super::FieldDefinition;

/// Unique id of the synthetic device status entity. No field may use it as tag.
pub const STATUS_UNIQUE_ID: &str = "dsmr-device";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FieldTableError {
    #[error("field '{key}' has an empty tag")]
    EmptyTag { key: String },
    #[error("duplicate tag '{0}'")]
    DuplicateTag(String),
    #[error("duplicate key '{0}'")]
    DuplicateKey(String),
    #[error("tag '{0}' is reserved for the device status entity")]
    ReservedTag(String),
}

/// Ordered, immutable set of field definitions.
///
/// Tags double as Home Assistant unique ids, so they are checked for
/// uniqueness once here instead of at every payload build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTable {
    fields: Vec<FieldDefinition>,
}

impl FieldTable {
    pub fn new(fields: Vec<FieldDefinition>) -> Result<Self, FieldTableError> {
        let mut tags = HashSet::with_capacity(fields.len());
        let mut keys = HashSet::with_capacity(fields.len());

        for f in &fields {
            if f.tag.is_empty() {
                return Err(FieldTableError::EmptyTag { key: f.key.clone() });
            }
            if f.tag == STATUS_UNIQUE_ID {
                return Err(FieldTableError::ReservedTag(f.tag.clone()));
            }
            if !tags.insert(f.tag.as_str()) {
                return Err(FieldTableError::DuplicateTag(f.tag.clone()));
            }
            if !keys.insert(f.key.as_str()) {
                return Err(FieldTableError::DuplicateKey(f.key.clone()));
            }
        }

        Ok(Self { fields })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    /// Entries with discovery enabled, in table order.
    pub fn discoverable(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.discovery_enabled)
    }

    pub fn get(&self, key: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a FieldTable {
    type Item = &'a FieldDefinition;
    type IntoIter = std::slice::Iter<'a, FieldDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
