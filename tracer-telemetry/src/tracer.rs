//! The tracer capability shared by every sink.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracer_primitives::{CustomProperties, SeverityLevel};

use crate::exception::ExceptionDetails;

/// Capability implemented by every telemetry sink.
///
/// Calls never fail: implementations deliver on a best-effort basis and keep
/// their own failures to themselves.
pub trait Tracer: Send + Sync {
    /// Traces `message` at [`SeverityLevel::Information`].
    fn trace_information(&self, message: &str);

    /// Traces `message` at [`SeverityLevel::Error`].
    fn trace_error(&self, message: &str);

    /// Traces `message` at [`SeverityLevel::Warning`].
    fn trace_warning(&self, message: &str);

    /// Traces `message` at [`SeverityLevel::Verbose`].
    fn trace_verbose(&self, message: &str);

    /// Reports an exception.
    ///
    /// The default traces the full representation at error severity; sinks
    /// with a structured exception channel also record it there.
    fn report_exception(&self, exception: &ExceptionDetails) {
        self.trace_error(&exception.to_string());
    }

    /// Reports a metric sample.
    ///
    /// The default renders the sample as a verbose trace.
    fn report_metric(&self, name: &str, value: f64, properties: Option<&CustomProperties>) {
        let _ = properties;
        self.trace_verbose(&format!("Metric {name}: {value}"));
    }

    /// Delivers anything buffered before returning.
    fn flush(&self);

    /// Traces `message` at an arbitrary severity.
    fn trace(&self, severity: SeverityLevel, message: &str) {
        match severity {
            SeverityLevel::Verbose => self.trace_verbose(message),
            SeverityLevel::Information => self.trace_information(message),
            SeverityLevel::Warning => self.trace_warning(message),
            SeverityLevel::Error | SeverityLevel::Critical => self.trace_error(message),
        }
    }
}

impl<T> Tracer for Arc<T>
where
    T: Tracer + ?Sized,
{
    fn trace_information(&self, message: &str) {
        (**self).trace_information(message);
    }

    fn trace_error(&self, message: &str) {
        (**self).trace_error(message);
    }

    fn trace_warning(&self, message: &str) {
        (**self).trace_warning(message);
    }

    fn trace_verbose(&self, message: &str) {
        (**self).trace_verbose(message);
    }

    fn report_exception(&self, exception: &ExceptionDetails) {
        (**self).report_exception(exception);
    }

    fn report_metric(&self, name: &str, value: f64, properties: Option<&CustomProperties>) {
        (**self).report_metric(name, value, properties);
    }

    fn flush(&self) {
        (**self).flush();
    }

    fn trace(&self, severity: SeverityLevel, message: &str) {
        (**self).trace(severity, message);
    }
}

/// Convenience methods available on every [`Tracer`].
pub trait TracerExt: Tracer {
    /// Captures `error` with its cause chain and reports it.
    fn report_error<E>(&self, error: &E)
    where
        E: StdError + ?Sized,
    {
        self.report_exception(&ExceptionDetails::from_error(error));
    }
}

impl<T: Tracer + ?Sized> TracerExt for T {}

/// Description of a call made to an external dependency.
#[derive(Clone, Debug, PartialEq)]
pub struct DependencyCall {
    /// Dependency name (service, database, queue...).
    pub dependency_name: String,
    /// Command issued against the dependency.
    pub command_name: String,
    /// Wall-clock start of the call.
    pub start_time: DateTime<Utc>,
    /// Time taken.
    pub duration: Duration,
    /// Whether the call succeeded.
    pub success: bool,
}

impl DependencyCall {
    /// Creates a dependency call description.
    #[must_use]
    pub fn new(
        dependency_name: impl Into<String>,
        command_name: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: Duration,
        success: bool,
    ) -> Self {
        Self {
            dependency_name: dependency_name.into(),
            command_name: command_name.into(),
            start_time,
            duration,
            success,
        }
    }
}

/// Telemetry-specific operations beyond the [`Tracer`] capability.
pub trait TelemetryReporter: Tracer {
    /// Adds a property to every item emitted afterwards; an existing key is
    /// overwritten.
    fn add_custom_property(&mut self, key: &str, value: &str);

    /// Records a request that took `elapsed` and finished now.
    fn track_request(&self, name: &str, elapsed: Duration);

    /// Records a dependency call.
    fn track_dependency(&self, call: DependencyCall);
}
