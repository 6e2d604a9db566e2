//! General resource settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Resource base name (used as the `same_as_base` category).
    #[serde(default)]
    pub base_name: String,

    /// Master document whose records are merged in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert!(config.base_name.is_empty());
        assert!(config.master.is_none());
    }
}
