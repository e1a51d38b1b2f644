/// One measurement exposed by the telegram parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// OBIS reference, e.g. `1-0:1.7.0`.
    pub key: String,
    /// JSON key of the value in state payloads.
    pub tag: String,
    /// Sub-topic below the configured prefix.
    pub topic: String,
    pub description: String,
    /// Physical unit, empty when the value is dimensionless or textual.
    pub unit: String,
    pub icon: String,
    pub discovery_enabled: bool,
}

impl FieldDefinition {
    pub fn new(
        key: impl Into<String>,
        tag: impl Into<String>,
        topic: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        icon: impl Into<String>,
        discovery_enabled: bool,
    ) -> Self {
        Self {
            key: key.into(),
            tag: tag.into(),
            topic: topic.into(),
            description: description.into(),
            unit: unit.into(),
            icon: icon.into(),
            discovery_enabled,
        }
    }

    pub fn has_unit(&self) -> bool {
        !self.unit.is_empty()
    }
}
