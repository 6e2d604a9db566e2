use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named group referencing several element entries as one unit.
///
/// Not itself selectable; references to `label` expand to `ordered_elements`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CompoundEntry {
    pub label: String,
    pub main_label: String,
    pub ordered_elements: Vec<String>,
}

impl CompoundEntry {
    pub fn new(label: impl Into<String>, main_label: impl Into<String>, elements: &[&str]) -> Self {
        Self {
            label: label.into(),
            main_label: main_label.into(),
            ordered_elements: elements.iter().map(ToString::to_string).collect(),
        }
    }
}
