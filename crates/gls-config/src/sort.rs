//! Sort section: primary, linked-variant and secondary passes.

use gls_core::policy::{SecondarySort, SortPass};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SortConfig {
    #[serde(default)]
    pub primary: SortPass,

    /// Sort linked variants separately; when unset they are combined with primaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<SortPass>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<SecondarySort>,
}
