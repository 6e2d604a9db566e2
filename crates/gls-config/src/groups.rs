//! Group section: letter groups and small-group merging.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GroupConfig {
    /// Coalesce adjacent runs of groups no larger than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_small_groups: Option<usize>,

    /// Deepest hierarchy level that receives its own group.
    #[serde(default)]
    pub group_level: usize,
}
