//! Binding providers consulted by the host for each job parameter.

use std::sync::Arc;

use async_trait::async_trait;
use tracer_telemetry::{TelemetryConfiguration, Tracer};
use tracing::{debug, warn};

use crate::binding::TracerBinding;
use crate::error::BindingResult;
use crate::overrides::resolve_configuration;
use crate::parameter::{ParameterDescriptor, ParameterKind};

/// Creates bindings for the parameters it recognises.
#[async_trait]
pub trait BindingProvider: Send + Sync {
    /// Binding produced for recognised parameters.
    type Binding: Send + Sync;

    /// Returns `Ok(None)` for parameters this provider does not handle.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError`](crate::BindingError) when a recognised
    /// parameter carries an unusable override.
    async fn try_create(
        &self,
        parameter: &ParameterDescriptor,
    ) -> BindingResult<Option<Self::Binding>>;
}

/// Provider for tracer parameters.
///
/// Every binding it creates writes to the host logger in addition to the
/// telemetry backend.
pub struct TracerBindingProvider {
    configuration: TelemetryConfiguration,
    host_logger: Arc<dyn Tracer>,
}

impl TracerBindingProvider {
    /// Creates a provider over the default configuration.
    #[must_use]
    pub fn new(configuration: TelemetryConfiguration, host_logger: Arc<dyn Tracer>) -> Self {
        Self {
            configuration,
            host_logger,
        }
    }

    /// Configuration used for parameters without an override.
    #[must_use]
    pub fn configuration(&self) -> &TelemetryConfiguration {
        &self.configuration
    }
}

#[async_trait]
impl BindingProvider for TracerBindingProvider {
    type Binding = TracerBinding;

    async fn try_create(
        &self,
        parameter: &ParameterDescriptor,
    ) -> BindingResult<Option<TracerBinding>> {
        if parameter.kind() != &ParameterKind::Tracer {
            return Ok(None);
        }

        let configuration = resolve_configuration(
            parameter.name(),
            &self.configuration,
            parameter.configuration_override(),
        )
        .inspect_err(|err| warn!(parameter = parameter.name(), %err, "tracer binding rejected"))?;

        if configuration.instrumentation_key().is_none() {
            debug!(
                parameter = parameter.name(),
                "no instrumentation key configured; telemetry for this parameter is dropped"
            );
        }

        Ok(Some(TracerBinding::new(
            parameter.name(),
            configuration,
            vec![Arc::clone(&self.host_logger)],
        )))
    }
}

impl std::fmt::Debug for TracerBindingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracerBindingProvider")
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}
