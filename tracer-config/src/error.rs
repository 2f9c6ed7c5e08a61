//! Error types for settings resolution.

use thiserror::Error;

/// Errors emitted while resolving backend settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value taken from the environment or a settings file was rejected.
    #[error("invalid setting `{name}`: {source}")]
    InvalidValue {
        /// Name of the setting or environment variable.
        name: &'static str,
        /// Validation failure from the primitives crate.
        #[source]
        source: tracer_primitives::Error,
    },
    /// The endpoint is not an absolute http(s) URL with a host.
    #[error("invalid telemetry endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint {
        /// Rejected value.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A settings document could not be parsed.
    #[error("settings parse error: {source}")]
    Parse {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Helper to construct endpoint errors.
    #[must_use]
    pub fn invalid_endpoint(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for settings resolution.
pub type ConfigResult<T> = Result<T, ConfigError>;
