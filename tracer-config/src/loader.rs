//! Ambient default resolution from the process environment.

use tracer_primitives::InstrumentationKey;
use tracing::debug;

use crate::{BackendSettings, ConfigError, ConfigResult};

/// Environment variable holding the default instrumentation key.
pub const INSTRUMENTATION_KEY_VAR: &str = "APPINSIGHTS_INSTRUMENTATIONKEY";

/// Environment variable overriding the ingestion endpoint.
pub const ENDPOINT_VAR: &str = "APPINSIGHTS_ENDPOINT";

impl BackendSettings {
    /// Resolves the ambient default settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] or [`ConfigError::InvalidEndpoint`]
    /// when a variable is set to an unusable value.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves settings through an arbitrary variable lookup.
    ///
    /// Unset or blank variables fall back to the defaults; a missing key leaves
    /// telemetry disabled rather than failing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] or [`ConfigError::InvalidEndpoint`]
    /// when a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        match lookup(INSTRUMENTATION_KEY_VAR).filter(|value| !value.trim().is_empty()) {
            Some(value) => {
                let key = InstrumentationKey::new(value).map_err(|source| {
                    ConfigError::InvalidValue {
                        name: INSTRUMENTATION_KEY_VAR,
                        source,
                    }
                })?;
                settings = settings.instrumentation_key(key);
            }
            None => debug!(
                variable = INSTRUMENTATION_KEY_VAR,
                "no default instrumentation key; telemetry stays disabled"
            ),
        }

        if let Some(endpoint) = lookup(ENDPOINT_VAR).filter(|value| !value.trim().is_empty()) {
            settings = settings.endpoint(endpoint.trim())?;
        }

        Ok(settings)
    }
}
