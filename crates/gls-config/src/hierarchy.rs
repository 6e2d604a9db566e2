//! Hierarchy section: missing parents, flattening and saved metadata.

use gls_core::policy::{FlattenPolicy, MissingParentPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HierarchyConfig {
    #[serde(default)]
    pub missing_parents: MissingParentPolicy,

    #[serde(default)]
    pub flatten: FlattenPolicy,

    /// Emit each entry's number of selected children.
    #[serde(default)]
    pub save_child_count: bool,

    /// Emit each entry's number of selected siblings.
    #[serde(default)]
    pub save_sibling_count: bool,

    /// Emit each entry's topmost selected ancestor.
    #[serde(default)]
    pub save_root_ancestor: bool,
}
