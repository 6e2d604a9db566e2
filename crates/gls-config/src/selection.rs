//! Selection section: which entries a run starts from.

use gls_core::enums::SelectionMode;
use gls_core::policy::MatchPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub mode: SelectionMode,

    /// Keep only the first `limit` committed entries (0 = unlimited).
    #[serde(default)]
    pub limit: usize,

    /// Field-pattern filter or additive match.
    #[serde(default, rename = "match")]
    pub match_policy: MatchPolicy,

    /// A primary and its linked variant always select each other.
    #[serde(default)]
    pub variant_dependency: bool,
}
