//! JSONL input event envelope.
//!
//! The external parser hands the engine one event per line: entry
//! definitions, usage records and compound definitions, each tagged with a
//! `kind`. [`InputBatch`] regroups a stream of events, assigning definition
//! order to entries as they arrive.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{CompoundEntry, CrossRefs, Entry, UsageRecord};

fn default_entry_type() -> String {
    "entry".to_string()
}

/// An entry construction event.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EntryEvent {
    pub label: String,
    #[serde(default = "default_entry_type")]
    pub entry_type: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub see: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub see_also: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl EntryEvent {
    /// Build the engine's entry, stamped with its definition position.
    #[must_use]
    pub fn into_entry(self, definition_index: usize) -> Entry {
        Entry {
            original_label: self.label.clone(),
            label: self.label,
            entry_type: self.entry_type,
            fields: self.fields,
            parent: self.parent,
            variant_link: self.variant,
            cross_refs: CrossRefs {
                see: self.see,
                see_also: self.see_also,
                alias: self.alias,
            },
            dependencies: self.dependencies,
            usage_record_count: 0,
            selected: false,
            synthesized: false,
            original_name: None,
            definition_index,
        }
    }
}

/// One line of the input stream.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputEvent {
    Entry(EntryEvent),
    Record(UsageRecord),
    Compound(CompoundEntry),
}

/// Events regrouped by kind, entries in definition order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBatch {
    pub entries: Vec<Entry>,
    pub records: Vec<UsageRecord>,
    pub compounds: Vec<CompoundEntry>,
}

impl InputBatch {
    pub fn from_events(events: impl IntoIterator<Item = InputEvent>) -> Self {
        let mut batch = Self::default();
        for event in events {
            match event {
                InputEvent::Entry(entry) => {
                    let index = batch.entries.len();
                    batch.entries.push(entry.into_entry(index));
                }
                InputEvent::Record(record) => batch.records.push(record),
                InputEvent::Compound(compound) => batch.compounds.push(compound),
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_event_defaults() {
        let json = r#"{"kind":"entry","label":"duck"}"#;
        let event: InputEvent = serde_json::from_str(json).unwrap();
        let InputEvent::Entry(entry) = event else {
            panic!("expected entry event");
        };
        assert_eq!(entry.entry_type, "entry");
        assert!(entry.fields.is_empty());
        assert!(entry.parent.is_none());
    }

    #[test]
    fn batch_assigns_definition_order() {
        let lines = [
            r#"{"kind":"entry","label":"b","fields":{"name":"B"}}"#,
            r#"{"kind":"record","label":"b","location":"3"}"#,
            r#"{"kind":"entry","label":"a","parent":"b","see":["b"]}"#,
            r#"{"kind":"compound","label":"ab","main_label":"a","ordered_elements":["a","b"]}"#,
        ];
        let events = lines
            .iter()
            .map(|line| serde_json::from_str::<InputEvent>(line).unwrap());
        let batch = InputBatch::from_events(events);

        assert_eq!(batch.entries.len(), 2);
        assert_eq!(batch.entries[0].label, "b");
        assert_eq!(batch.entries[1].definition_index, 1);
        assert_eq!(batch.entries[1].cross_refs.see, vec!["b".to_string()]);
        assert_eq!(batch.records[0].location, "3");
        assert_eq!(batch.compounds[0].main_label, "a");
    }
}
