//! Per-parameter configuration overrides.

use tracer_config::ConfigError;
use tracer_primitives::InstrumentationKey;
use tracer_telemetry::TelemetryConfiguration;
use tracing::debug;

use crate::error::{BindingError, BindingResult};

/// Override attached to one tracer parameter.
///
/// Exactly one of the two options must be set. A bare instrumentation key
/// keeps the default configuration's channel and endpoint.
#[derive(Clone, Debug, Default)]
pub struct TracerConfigurationOverride {
    instrumentation_key: Option<String>,
    configuration: Option<TelemetryConfiguration>,
}

impl TracerConfigurationOverride {
    /// Empty override; resolving it fails until one option is set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override carrying only an instrumentation key.
    #[must_use]
    pub fn from_instrumentation_key(key: impl Into<String>) -> Self {
        Self::new().instrumentation_key(key)
    }

    /// Override carrying a full configuration.
    #[must_use]
    pub fn from_configuration(configuration: TelemetryConfiguration) -> Self {
        Self::new().configuration(configuration)
    }

    /// Sets the instrumentation key option.
    #[must_use]
    pub fn instrumentation_key(mut self, key: impl Into<String>) -> Self {
        self.instrumentation_key = Some(key.into());
        self
    }

    /// Sets the full configuration option.
    #[must_use]
    pub fn configuration(mut self, configuration: TelemetryConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }
}

/// Picks the configuration a tracer parameter is bound with.
///
/// # Errors
///
/// Returns [`BindingError::InvalidOverride`] when the override sets neither or
/// both options, and [`BindingError::Configuration`] when the overriding key
/// is not a valid instrumentation key.
pub fn resolve_configuration(
    parameter: &str,
    default: &TelemetryConfiguration,
    override_: Option<&TracerConfigurationOverride>,
) -> BindingResult<TelemetryConfiguration> {
    let Some(override_) = override_ else {
        return Ok(default.clone());
    };

    match (&override_.instrumentation_key, &override_.configuration) {
        (Some(raw), None) => {
            let key = InstrumentationKey::new(raw.as_str()).map_err(|source| {
                ConfigError::InvalidValue {
                    name: "instrumentation_key",
                    source,
                }
            })?;
            debug!(parameter, "tracer bound with overriding instrumentation key");
            let settings = default.settings().clone().instrumentation_key(key);
            Ok(default.clone().with_settings(settings))
        }
        (None, Some(configuration)) => {
            debug!(parameter, "tracer bound with overriding configuration");
            Ok(configuration.clone())
        }
        (None, None) => Err(BindingError::invalid_override(
            parameter,
            "set either an instrumentation key or a telemetry configuration",
        )),
        (Some(_), Some(_)) => Err(BindingError::invalid_override(
            parameter,
            "an instrumentation key and a telemetry configuration cannot both be set",
        )),
    }
}
