use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::CrossRefKind;

/// Cross-reference lists of an entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CrossRefs {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub see: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub see_also: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl CrossRefs {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.see.is_empty() && self.see_also.is_empty() && self.alias.is_none()
    }

    /// Targets of one cross-reference kind.
    #[must_use]
    pub fn targets(&self, kind: CrossRefKind) -> Vec<&str> {
        match kind {
            CrossRefKind::See => self.see.iter().map(String::as_str).collect(),
            CrossRefKind::SeeAlso => self.see_also.iter().map(String::as_str).collect(),
            CrossRefKind::Alias => self.alias.as_deref().into_iter().collect(),
        }
    }

    /// All targets tagged with their kind, `see` first.
    pub fn iter(&self) -> impl Iterator<Item = (CrossRefKind, &str)> {
        self.see
            .iter()
            .map(|t| (CrossRefKind::See, t.as_str()))
            .chain(self.see_also.iter().map(|t| (CrossRefKind::SeeAlso, t.as_str())))
            .chain(self.alias.iter().map(|t| (CrossRefKind::Alias, t.as_str())))
    }

    /// Whether any list names `label`.
    #[must_use]
    pub fn mentions(&self, label: &str) -> bool {
        self.iter().any(|(_, target)| target == label)
    }
}

/// A single selectable record.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Entry {
    pub label: String,
    /// Label before alias or duplicate handling.
    pub original_label: String,
    pub entry_type: String,
    pub fields: BTreeMap<String, String>,
    pub parent: Option<String>,
    /// Label of the paired variant; symmetric across the pair.
    pub variant_link: Option<String>,
    pub cross_refs: CrossRefs,
    /// Labels referenced from inside field values.
    pub dependencies: Vec<String>,
    pub usage_record_count: u32,
    pub selected: bool,
    /// Fabricated by the missing-parent policy.
    pub synthesized: bool,
    /// Name before lonely-child flattening rewrote it.
    pub original_name: Option<String>,
    /// Position in the parser's definition sequence.
    pub definition_index: usize,
}

impl Entry {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            original_label: label.clone(),
            label,
            entry_type: "entry".to_string(),
            fields: BTreeMap::new(),
            parent: None,
            variant_link: None,
            cross_refs: CrossRefs::default(),
            dependencies: Vec::new(),
            usage_record_count: 0,
            selected: false,
            synthesized: false,
            original_name: None,
            definition_index: 0,
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_see(mut self, targets: &[&str]) -> Self {
        self.cross_refs.see = targets.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn with_see_also(mut self, targets: &[&str]) -> Self {
        self.cross_refs.see_also = targets.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn with_alias(mut self, target: impl Into<String>) -> Self {
        self.cross_refs.alias = Some(target.into());
        self
    }

    #[must_use]
    pub fn with_dependencies(mut self, labels: &[&str]) -> Self {
        self.dependencies = labels.iter().map(ToString::to_string).collect();
        self
    }

    #[must_use]
    pub fn with_variant(mut self, label: impl Into<String>) -> Self {
        self.variant_link = Some(label.into());
        self
    }

    #[must_use]
    pub const fn has_usage_records(&self) -> bool {
        self.usage_record_count > 0
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Display name: the `name` field, falling back to the label.
    #[must_use]
    pub fn name(&self) -> &str {
        self.field("name").unwrap_or(&self.label)
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.field("category")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_refs_iterate_in_kind_order() {
        let entry = Entry::new("x")
            .with_see(&["a"])
            .with_see_also(&["b"])
            .with_alias("c");
        let kinds: Vec<_> = entry.cross_refs.iter().collect();
        assert_eq!(
            kinds,
            vec![
                (CrossRefKind::See, "a"),
                (CrossRefKind::SeeAlso, "b"),
                (CrossRefKind::Alias, "c"),
            ]
        );
        assert!(entry.cross_refs.mentions("b"));
        assert!(!entry.cross_refs.is_empty());
    }

    #[test]
    fn name_falls_back_to_label() {
        let entry = Entry::new("duck");
        assert_eq!(entry.name(), "duck");
        let named = entry.with_field("name", "Duck");
        assert_eq!(named.name(), "Duck");
    }
}
