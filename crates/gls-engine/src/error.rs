//! Engine error types.

use gls_config::ConfigError;
use gls_core::errors::CoreError;

/// Fatal errors. Any of these aborts the run before output is produced.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// `selected_before` was requested but no earlier run selected anything.
    #[error("selection mode selected_before requires a prior selection, but none exists")]
    SelectedBeforeWithoutPrior,

    /// An entry names itself as its parent.
    #[error("entry '{label}' is its own parent")]
    SelfParent { label: String },

    /// Following parent labels loops back on itself.
    #[error("parent cycle detected: {}", chain.join(" -> "))]
    ParentCycle { chain: Vec<String> },

    /// Two options that cannot be combined were both supplied.
    #[error("options '{first}' and '{second}' are mutually exclusive")]
    ExclusiveOptions { first: String, second: String },

    /// A configured field pattern is not a valid regular expression.
    #[error("invalid pattern for field '{field}': {pattern}")]
    InvalidPattern {
        field: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Any other invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The entry store or its input violated a model invariant.
    #[error("model error: {0}")]
    Model(#[from] CoreError),
}

impl From<ConfigError> for EngineError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Exclusive { first, second } => Self::ExclusiveOptions { first, second },
            other => Self::InvalidConfig(other.to_string()),
        }
    }
}
