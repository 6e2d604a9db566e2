pub mod config;
pub mod schema;
pub mod select;

use gls_config::GlsConfig;

use crate::cli::GlobalFlags;

/// Load the layered configuration, honouring `--config` and `.env`.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<GlsConfig> {
    let config = GlsConfig::load_with_dotenv(flags.config.as_deref())?;
    tracing::debug!(mode = %config.selection.mode, "configuration loaded");
    Ok(config)
}
