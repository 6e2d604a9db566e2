//! Cross-cutting error types.
//!
//! Errors raised while building or validating the data model. Engine-level
//! failures (cycles, configuration conflicts) live in `gls-engine`; the CLI
//! converges everything into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any gls crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Two entries were defined with the same label.
    #[error("Duplicate entry label: {label}")]
    DuplicateLabel { label: String },

    /// A variant link points at an entry that does not exist.
    #[error("Variant link from {label} targets unknown entry {target}")]
    MissingVariant { label: String, target: String },

    /// A variant link is not reciprocated by its counterpart.
    #[error("Variant link {label} -> {target} is not symmetric (target links to {actual})")]
    AsymmetricVariant {
        label: String,
        target: String,
        actual: String,
    },

    /// Data failed validation (format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
