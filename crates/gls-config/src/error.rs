//! Configuration error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// Two options that cannot be combined were both supplied.
    #[error("Options '{first}' and '{second}' are mutually exclusive")]
    Exclusive { first: String, second: String },

    /// A configuration field has an invalid value.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// Rendering the effective configuration failed.
    #[error("Could not render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}
