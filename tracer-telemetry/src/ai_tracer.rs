//! Tracer backed by the telemetry client.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracer_config::ConfigResult;
use tracer_primitives::{CustomProperties, Measurements, OperationId, SessionId, SeverityLevel};

use crate::client::TelemetryClient;
use crate::configuration::TelemetryConfiguration;
use crate::envelope::{
    DependencyTelemetry, MetricTelemetry, RequestTelemetry, TelemetryItem, TraceTelemetry,
};
use crate::exception::ExceptionDetails;
use crate::operation::{OperationContext, OperationHandler, OperationRecord};
use crate::tracer::{DependencyCall, TelemetryReporter, Tracer};

/// Builder for [`AITracer`] instances.
#[derive(Debug)]
pub struct AITracerBuilder {
    configuration: TelemetryConfiguration,
    session_id: Option<SessionId>,
    custom_properties: CustomProperties,
}

impl AITracerBuilder {
    /// Starts a builder over the supplied configuration.
    #[must_use]
    pub fn new(configuration: TelemetryConfiguration) -> Self {
        Self {
            configuration,
            session_id: None,
            custom_properties: CustomProperties::new(),
        }
    }

    /// Uses an explicit session id instead of a random one.
    #[must_use]
    pub fn session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Seeds a custom property.
    #[must_use]
    pub fn custom_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_properties.insert(key, value);
        self
    }

    /// Builds the tracer.
    #[must_use]
    pub fn build(self) -> AITracer {
        let session_id = self.session_id.unwrap_or_else(SessionId::random);
        AITracer {
            client: TelemetryClient::new(self.configuration, session_id),
            custom_properties: self.custom_properties,
        }
    }
}

/// Tracer that reports to the telemetry backend.
///
/// One instance belongs to one job invocation. Custom properties are scoped
/// to the instance and survive across operations.
#[derive(Debug)]
pub struct AITracer {
    client: TelemetryClient,
    custom_properties: CustomProperties,
}

impl AITracer {
    /// Creates a builder for a tracer bound to `configuration`.
    #[must_use]
    pub fn builder(configuration: TelemetryConfiguration) -> AITracerBuilder {
        AITracerBuilder::new(configuration)
    }

    /// Creates a tracer bound to `configuration` with a random session.
    #[must_use]
    pub fn new(configuration: TelemetryConfiguration) -> Self {
        Self::builder(configuration).build()
    }

    /// Creates a tracer bound to the ambient default configuration.
    ///
    /// # Errors
    ///
    /// Propagates configuration errors from the environment.
    pub fn from_env() -> ConfigResult<Self> {
        TelemetryConfiguration::from_env().map(Self::new)
    }

    /// Creates a tracer bound to the supplied instrumentation key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the key is not usable.
    pub fn from_instrumentation_key(key: &str) -> ConfigResult<Self> {
        TelemetryConfiguration::from_instrumentation_key(key).map(Self::new)
    }

    /// Session stamped onto every item.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.client.session_id()
    }

    /// Configuration the tracer reports through.
    #[must_use]
    pub fn configuration(&self) -> &TelemetryConfiguration {
        self.client.configuration()
    }

    /// Properties stamped onto every item.
    #[must_use]
    pub fn custom_properties(&self) -> &CustomProperties {
        &self.custom_properties
    }

    /// Operation currently open on this tracer, if any.
    #[must_use]
    pub fn current_operation(&self) -> Option<&OperationContext> {
        self.client.operation()
    }

    fn track(&self, mut item: TelemetryItem) {
        // Item-level properties win over the tracer-scoped ones.
        let mut properties = self.custom_properties.clone();
        properties.extend_from(item.properties());
        *item.properties_mut() = properties;
        self.client.track(item);
    }

    fn trace_at(&self, severity_level: SeverityLevel, message: &str) {
        self.track(TelemetryItem::Trace(TraceTelemetry {
            message: message.to_owned(),
            severity_level,
            properties: CustomProperties::new(),
        }));
    }
}

impl Tracer for AITracer {
    fn trace_information(&self, message: &str) {
        self.trace_at(SeverityLevel::Information, message);
    }

    fn trace_error(&self, message: &str) {
        self.trace_at(SeverityLevel::Error, message);
    }

    fn trace_warning(&self, message: &str) {
        self.trace_at(SeverityLevel::Warning, message);
    }

    fn trace_verbose(&self, message: &str) {
        self.trace_at(SeverityLevel::Verbose, message);
    }

    fn report_exception(&self, exception: &ExceptionDetails) {
        self.trace_at(SeverityLevel::Error, &exception.to_string());
        self.track(TelemetryItem::Exception(exception.to_telemetry()));
    }

    fn report_metric(&self, name: &str, value: f64, properties: Option<&CustomProperties>) {
        self.track(TelemetryItem::Metric(MetricTelemetry {
            name: name.to_owned(),
            value,
            properties: properties.cloned().unwrap_or_default(),
        }));
    }

    fn flush(&self) {
        self.client.flush();
    }

    fn trace(&self, severity: SeverityLevel, message: &str) {
        self.trace_at(severity, message);
    }
}

impl TelemetryReporter for AITracer {
    fn add_custom_property(&mut self, key: &str, value: &str) {
        self.custom_properties.insert(key, value);
    }

    fn track_request(&self, name: &str, elapsed: Duration) {
        // Durations reaching past the representable range clamp the start.
        let now = Utc::now();
        let start_time = chrono::Duration::from_std(elapsed)
            .ok()
            .and_then(|delta| now.checked_sub_signed(delta))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.track(TelemetryItem::Request(RequestTelemetry {
            id: OperationId::random(),
            name: name.to_owned(),
            start_time,
            duration: elapsed,
            response_code: "200".to_owned(),
            success: true,
            properties: CustomProperties::new(),
            measurements: Measurements::new(),
        }));
    }

    fn track_dependency(&self, call: DependencyCall) {
        self.track(TelemetryItem::Dependency(DependencyTelemetry {
            name: call.dependency_name,
            command: call.command_name,
            start_time: call.start_time,
            duration: call.duration,
            success: call.success,
            properties: CustomProperties::new(),
        }));
    }
}

impl OperationHandler for AITracer {
    fn begin_operation(&mut self, context: &OperationContext) {
        self.client.set_operation(Some(context.clone()));
    }

    fn complete_operation(&mut self, record: &OperationRecord) {
        let status = record.status();
        self.track(TelemetryItem::Request(RequestTelemetry {
            id: record.context().id(),
            name: record.context().name().to_owned(),
            start_time: record.started_at(),
            duration: record.elapsed(),
            response_code: status.response_code().to_owned(),
            success: status.is_success(),
            properties: CustomProperties::new(),
            measurements: record.measurements().clone(),
        }));
        self.client.set_operation(None);
    }
}
