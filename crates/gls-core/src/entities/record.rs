use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One observed use of an entry, in document order.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct UsageRecord {
    pub label: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub counter: String,
}

impl UsageRecord {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            location: String::new(),
            format: String::new(),
            counter: String::new(),
        }
    }

    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Copy of this record attributed to another label.
    #[must_use]
    pub fn relabelled(&self, label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..self.clone()
        }
    }
}
