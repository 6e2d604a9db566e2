//! Primary/dual/tertiary label prefixes.
//!
//! A linked variant (dual) of `pi` is conventionally labelled `dual.pi`; the
//! store uses [`LabelPrefixes::flip`] to try the counterpart label when a
//! lookup misses.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

fn default_dual() -> String {
    "dual.".to_string()
}

fn default_tertiary() -> String {
    "tertiary.".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LabelPrefixes {
    #[serde(default)]
    pub primary: String,
    #[serde(default = "default_dual")]
    pub dual: String,
    #[serde(default = "default_tertiary")]
    pub tertiary: String,
}

impl Default for LabelPrefixes {
    fn default() -> Self {
        Self {
            primary: String::new(),
            dual: default_dual(),
            tertiary: default_tertiary(),
        }
    }
}

impl LabelPrefixes {
    /// Swap the variant prefix of `label`.
    ///
    /// Dual and tertiary labels map back to the primary prefix; anything else
    /// is treated as primary and mapped to the dual prefix.
    #[must_use]
    pub fn flip(&self, label: &str) -> String {
        if !self.dual.is_empty()
            && let Some(rest) = label.strip_prefix(self.dual.as_str())
        {
            return format!("{}{rest}", self.primary);
        }
        if !self.tertiary.is_empty()
            && let Some(rest) = label.strip_prefix(self.tertiary.as_str())
        {
            return format!("{}{rest}", self.primary);
        }
        let rest = label.strip_prefix(self.primary.as_str()).unwrap_or(label);
        format!("{}{rest}", self.dual)
    }

    /// Whether `label` carries the dual or tertiary prefix.
    #[must_use]
    pub fn is_variant_label(&self, label: &str) -> bool {
        (!self.dual.is_empty() && label.starts_with(self.dual.as_str()))
            || (!self.tertiary.is_empty() && label.starts_with(self.tertiary.as_str()))
    }

    /// The label with whichever known prefix it carries removed.
    #[must_use]
    pub fn strip<'a>(&self, label: &'a str) -> &'a str {
        for prefix in [&self.dual, &self.tertiary, &self.primary] {
            if !prefix.is_empty()
                && let Some(rest) = label.strip_prefix(prefix.as_str())
            {
                return rest;
            }
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_round_trips_primary_and_dual() {
        let prefixes = LabelPrefixes::default();
        assert_eq!(prefixes.flip("pi"), "dual.pi");
        assert_eq!(prefixes.flip("dual.pi"), "pi");
        assert_eq!(prefixes.flip("tertiary.pi"), "pi");
    }

    #[test]
    fn flip_respects_non_empty_primary_prefix() {
        let prefixes = LabelPrefixes {
            primary: "gls.".into(),
            dual: "acr.".into(),
            tertiary: "sym.".into(),
        };
        assert_eq!(prefixes.flip("gls.html"), "acr.html");
        assert_eq!(prefixes.flip("acr.html"), "gls.html");
        assert_eq!(prefixes.flip("sym.html"), "gls.html");
    }

    #[test]
    fn strip_removes_known_prefix() {
        let prefixes = LabelPrefixes::default();
        assert_eq!(prefixes.strip("dual.pi"), "pi");
        assert_eq!(prefixes.strip("pi"), "pi");
        assert!(prefixes.is_variant_label("tertiary.pi"));
        assert!(!prefixes.is_variant_label("pi"));
    }
}
