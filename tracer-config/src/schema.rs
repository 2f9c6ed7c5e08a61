//! Strongly typed backend settings.

use serde::{Deserialize, Serialize};
use tracer_primitives::InstrumentationKey;
use url::Url;

use crate::{ConfigError, ConfigResult};

/// Ingestion endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://dc.services.visualstudio.com/v2/track";

/// Settings identifying the telemetry backend a tracer reports to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    instrumentation_key: Option<InstrumentationKey>,
    #[serde(default = "default_endpoint")]
    endpoint: String,
    #[serde(default)]
    disable_telemetry: bool,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_owned()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            instrumentation_key: None,
            endpoint: default_endpoint(),
            disable_telemetry: false,
        }
    }
}

impl BackendSettings {
    /// Settings bound to the supplied instrumentation key and the default endpoint.
    #[must_use]
    pub fn with_instrumentation_key(key: InstrumentationKey) -> Self {
        Self {
            instrumentation_key: Some(key),
            ..Self::default()
        }
    }

    /// Replaces the instrumentation key.
    #[must_use]
    pub fn instrumentation_key(mut self, key: InstrumentationKey) -> Self {
        self.instrumentation_key = Some(key);
        self
    }

    /// Replaces the ingestion endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEndpoint`] when the value is not an
    /// absolute http(s) URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> ConfigResult<Self> {
        let endpoint = endpoint.into();
        validate_endpoint(&endpoint)?;
        self.endpoint = endpoint;
        Ok(self)
    }

    /// Turns emission off without removing the key.
    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disable_telemetry = disabled;
        self
    }

    /// Returns the configured instrumentation key, if any.
    #[must_use]
    pub fn key(&self) -> Option<&InstrumentationKey> {
        self.instrumentation_key.as_ref()
    }

    /// Returns the ingestion endpoint.
    #[must_use]
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint
    }

    /// Returns `true` when telemetry should be emitted: a key is present and
    /// emission has not been disabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.instrumentation_key.is_some() && !self.disable_telemetry
    }

    /// Parses settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents or invalid keys,
    /// and [`ConfigError::InvalidEndpoint`] for a bad endpoint.
    pub fn from_json_str(document: &str) -> ConfigResult<Self> {
        let settings: Self = serde_json::from_str(document)?;
        validate_endpoint(&settings.endpoint)?;
        Ok(settings)
    }
}

pub(crate) fn validate_endpoint(endpoint: &str) -> ConfigResult<()> {
    let url = Url::parse(endpoint)
        .map_err(|err| ConfigError::invalid_endpoint(endpoint, err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::invalid_endpoint(
            endpoint,
            format!("unsupported scheme `{}`, expected http or https", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::invalid_endpoint(endpoint, "missing host"));
    }
    Ok(())
}
