//! # gls-config
//!
//! Layered configuration loading for the glossary selection engine using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`GLS_*` prefix, `__` as separator)
//! 2. An explicit file passed to [`GlsConfig::load_from`]
//! 3. Project-level `gls.toml`
//! 4. User-level `~/.config/gls/config.toml`
//! 5. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `GLS_SELECTION__LIMIT` -> `selection.limit`,
//! `GLS_GROUPS__MERGE_SMALL_GROUPS` -> `groups.merge_small_groups`, etc.
//! The `__` (double underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use gls_config::GlsConfig;
//!
//! let config = GlsConfig::load().expect("config");
//! config.validate().expect("consistent options");
//! println!("selection mode: {}", config.selection.mode);
//! ```

mod error;
mod general;
mod groups;
mod hierarchy;
mod selection;
mod sort;

pub use error::ConfigError;
pub use general::GeneralConfig;
pub use groups::GroupConfig;
pub use hierarchy::HierarchyConfig;
pub use selection::SelectionConfig;
pub use sort::SortConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use gls_core::labels::LabelPrefixes;
use gls_core::policy::PrunePolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the project-local configuration file.
pub const LOCAL_CONFIG_FILE: &str = "gls.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GlsConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
    #[serde(default)]
    pub prune: PrunePolicy,
    #[serde(default)]
    pub sort: SortConfig,
    #[serde(default)]
    pub groups: GroupConfig,
    #[serde(default)]
    pub labels: LabelPrefixes,
}

impl GlsConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, layering `path` above the default files.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Self::file_figment();
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Self::env_provider())
            .extract()
            .map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    pub fn load_with_dotenv(path: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load_from(path)
    }

    /// Build the full figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    pub fn figment() -> Figment {
        Self::file_figment().merge(Self::env_provider())
    }

    fn file_figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment
    }

    fn env_provider() -> Env {
        Env::prefixed("GLS_").split("__")
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gls").join("config.toml"))
    }

    /// Reject option combinations the engine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selection.limit > 0 && self.general.master.is_some() {
            return Err(ConfigError::Exclusive {
                first: "selection.limit".into(),
                second: "general.master".into(),
            });
        }
        if self.prune.iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "prune.iterations".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.groups.merge_small_groups == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "groups.merge_small_groups".into(),
                reason: "threshold must be at least 1".into(),
            });
        }
        if let Some(secondary) = &self.sort.secondary
            && secondary.list_name.trim().is_empty()
        {
            return Err(ConfigError::InvalidValue {
                field: "sort.secondary.list_name".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.labels.dual.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "labels.dual".into(),
                reason: "dual prefix must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use gls_core::enums::SelectionMode;
    use gls_core::policy::SortPolicy;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GlsConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.selection.mode, SelectionMode::RecordedAndDeps);
        assert_eq!(config.sort.primary.policy, SortPolicy::collation());
        assert!(config.sort.variant.is_none());
        assert!(!config.prune.enabled);
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: GlsConfig = GlsConfig::figment().extract()?;
            assert_eq!(config.selection.limit, 0);
            assert_eq!(config.labels.dual, "dual.");
            assert_eq!(config.groups.group_level, 0);
            Ok(())
        });
    }

    #[test]
    fn limit_with_master_is_rejected() {
        let mut config = GlsConfig::default();
        config.selection.limit = 3;
        config.general.master = Some("main".into());
        let error = config.validate().unwrap_err();
        assert!(matches!(error, ConfigError::Exclusive { .. }));
    }

    #[test]
    fn zero_prune_iterations_are_rejected() {
        let mut config = GlsConfig::default();
        config.prune.iterations = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn defaults_render_as_toml() {
        let rendered = GlsConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[selection]"));
        assert!(rendered.contains("recorded_and_deps"));
    }
}
