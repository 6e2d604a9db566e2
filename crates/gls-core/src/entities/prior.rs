use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Selection state carried from earlier resource batches into the next run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct PriorSelection {
    /// Labels selected by any earlier run.
    #[serde(default)]
    pub selected: BTreeSet<String>,
    /// Labels some earlier run's closure depended on.
    #[serde(default)]
    pub dependencies: BTreeSet<String>,
}

impl PriorSelection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.dependencies.is_empty()
    }

    #[must_use]
    pub fn was_selected(&self, label: &str) -> bool {
        self.selected.contains(label)
    }

    #[must_use]
    pub fn is_dependency(&self, label: &str) -> bool {
        self.dependencies.contains(label)
    }

    /// Fold another run's results into this context.
    pub fn absorb<'a>(
        &mut self,
        selected: impl IntoIterator<Item = &'a str>,
        dependencies: impl IntoIterator<Item = &'a str>,
    ) {
        self.selected.extend(selected.into_iter().map(ToString::to_string));
        self.dependencies
            .extend(dependencies.into_iter().map(ToString::to_string));
    }
}
