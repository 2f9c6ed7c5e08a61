//! Host registration.

use std::sync::Arc;

use tracer_config::ConfigResult;
use tracer_telemetry::{TelemetryConfiguration, Tracer};
use tracing::info;

use crate::provider::TracerBindingProvider;

/// Registers tracer bindings with a job host.
#[derive(Clone, Debug)]
pub struct TracerExtension {
    configuration: TelemetryConfiguration,
}

impl TracerExtension {
    /// Extension bound to an explicit configuration.
    #[must_use]
    pub fn new(configuration: TelemetryConfiguration) -> Self {
        Self { configuration }
    }

    /// Extension bound to the ambient default configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`ConfigError`](tracer_config::ConfigError) from
    /// [`TelemetryConfiguration::from_env`].
    pub fn from_env() -> ConfigResult<Self> {
        TelemetryConfiguration::from_env().map(Self::new)
    }

    /// Extension bound to the default configuration with `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`](tracer_config::ConfigError::InvalidValue)
    /// when the key is not usable.
    pub fn from_instrumentation_key(key: &str) -> ConfigResult<Self> {
        TelemetryConfiguration::from_instrumentation_key(key).map(Self::new)
    }

    /// Default configuration handed to bindings.
    #[must_use]
    pub fn configuration(&self) -> &TelemetryConfiguration {
        &self.configuration
    }

    /// Called by the host once at startup with its own logger.
    #[must_use]
    pub fn initialize(&self, host_logger: Arc<dyn Tracer>) -> TracerBindingProvider {
        info!(
            keyed = self.configuration.instrumentation_key().is_some(),
            enabled = self.configuration.settings().is_enabled(),
            "tracer extension initialised"
        );
        TracerBindingProvider::new(self.configuration.clone(), host_logger)
    }
}

#[cfg(test)]
mod tests {
    use tracer_telemetry::sinks::LogTracer;

    use super::*;
    use crate::parameter::ParameterDescriptor;
    use crate::provider::BindingProvider;

    #[tokio::test]
    async fn initialize_yields_a_provider_over_the_configuration() {
        let extension = TracerExtension::from_instrumentation_key("ext-key").unwrap();
        let provider = extension.initialize(Arc::new(LogTracer::new("host")));
        let binding = provider
            .try_create(&ParameterDescriptor::tracer("tracer"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            binding.configuration().instrumentation_key().unwrap().as_str(),
            "ext-key"
        );
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(TracerExtension::from_instrumentation_key("   ").is_err());
    }

    #[test]
    fn explicit_configuration_is_kept() {
        let configuration = TelemetryConfiguration::from_instrumentation_key("explicit").unwrap();
        let extension = TracerExtension::new(configuration);
        assert_eq!(
            extension.configuration().instrumentation_key().unwrap().as_str(),
            "explicit"
        );
    }
}
