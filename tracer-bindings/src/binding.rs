//! Per-invocation tracer bindings.

use std::sync::Arc;

use async_trait::async_trait;
use tracer_primitives::SessionId;
use tracer_telemetry::{AITracer, AggregatedTracer, TelemetryConfiguration, Tracer};
use tracing::debug;

use crate::parameter::BindingContext;

/// Display hint the host shows for tracer parameters.
pub const TRACER_PARAMETER_DESCRIPTION: &str = "AI Tracer";

/// Produces a value for one parameter on each invocation.
///
/// Binding is async so implementations can reach remote configuration or
/// secret stores; the tracer binding itself completes without suspending.
#[async_trait]
pub trait Binding: Send + Sync {
    /// Value handed to the job.
    type Value: Send;

    /// Creates the value for the invocation described by `context`.
    async fn bind(&self, context: &BindingContext) -> Self::Value;

    /// Name of the bound parameter.
    fn parameter_name(&self) -> &str;

    /// Short description for host dashboards.
    fn description(&self) -> &'static str;
}

/// Binding that hands every invocation its own aggregated tracer.
pub struct TracerBinding {
    parameter: String,
    configuration: TelemetryConfiguration,
    additional: Vec<Arc<dyn Tracer>>,
}

impl TracerBinding {
    /// Creates a binding for `parameter` whose tracers also write to
    /// `additional`.
    #[must_use]
    pub fn new(
        parameter: impl Into<String>,
        configuration: TelemetryConfiguration,
        additional: Vec<Arc<dyn Tracer>>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            configuration,
            additional,
        }
    }

    /// Configuration new tracers are bound to.
    #[must_use]
    pub fn configuration(&self) -> &TelemetryConfiguration {
        &self.configuration
    }

    /// Wraps a tracer supplied by the caller instead of building one.
    #[must_use]
    pub fn bind_existing(&self, tracer: AggregatedTracer) -> TracerValueProvider {
        TracerValueProvider::new(tracer, self.invoke_string())
    }

    fn invoke_string(&self) -> String {
        self.configuration
            .instrumentation_key()
            .map(|key| key.as_str().to_owned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Binding for TracerBinding {
    type Value = TracerValueProvider;

    async fn bind(&self, context: &BindingContext) -> TracerValueProvider {
        let primary = AITracer::builder(self.configuration.clone())
            .session_id(SessionId::from(context.invocation_id()))
            .build();
        debug!(
            parameter = %self.parameter,
            function = context.function_name(),
            invocation_id = %context.invocation_id(),
            sinks = self.additional.len(),
            "tracer bound"
        );
        let tracer = AggregatedTracer::new(primary, self.additional.iter().cloned());
        TracerValueProvider::new(tracer, self.invoke_string())
    }

    fn parameter_name(&self) -> &str {
        &self.parameter
    }

    fn description(&self) -> &'static str {
        TRACER_PARAMETER_DESCRIPTION
    }
}

impl std::fmt::Debug for TracerBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TracerBinding")
            .field("parameter", &self.parameter)
            .field("configuration", &self.configuration)
            .field("additional", &self.additional.len())
            .finish()
    }
}

/// The bound tracer and its invoke string.
#[derive(Debug)]
pub struct TracerValueProvider {
    tracer: AggregatedTracer,
    invoke_string: String,
}

impl TracerValueProvider {
    fn new(tracer: AggregatedTracer, invoke_string: String) -> Self {
        Self {
            tracer,
            invoke_string,
        }
    }

    /// The bound tracer.
    #[must_use]
    pub fn tracer(&self) -> &AggregatedTracer {
        &self.tracer
    }

    /// Mutable access, needed to open operations.
    pub fn tracer_mut(&mut self) -> &mut AggregatedTracer {
        &mut self.tracer
    }

    /// Hands the tracer over to the job.
    #[must_use]
    pub fn into_tracer(self) -> AggregatedTracer {
        self.tracer
    }

    /// String recorded by the host for this binding: the instrumentation key,
    /// or empty when none is configured.
    #[must_use]
    pub fn to_invoke_string(&self) -> &str {
        &self.invoke_string
    }
}
