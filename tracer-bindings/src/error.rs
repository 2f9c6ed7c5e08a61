//! Binding errors.

use thiserror::Error;
use tracer_config::ConfigError;

/// Errors raised while creating tracer bindings.
#[derive(Debug, Error)]
pub enum BindingError {
    /// A per-parameter override is malformed.
    #[error("invalid tracer override on parameter `{parameter}`: {reason}")]
    InvalidOverride {
        /// Name of the offending parameter.
        parameter: String,
        /// Human-readable reason.
        reason: String,
    },
    /// The resolved configuration is unusable.
    #[error("tracer configuration error: {source}")]
    Configuration {
        /// Source [`ConfigError`].
        #[from]
        source: ConfigError,
    },
}

impl BindingError {
    /// Helper to construct override errors.
    #[must_use]
    pub fn invalid_override(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOverride {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for binding operations.
pub type BindingResult<T> = Result<T, BindingError>;
