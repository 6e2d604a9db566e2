use gls_config::GlsConfig;

/// Handle `gls config`.
pub fn handle(config: &GlsConfig) -> anyhow::Result<()> {
    config.validate()?;
    print!("{}", config.to_toml()?);
    Ok(())
}
