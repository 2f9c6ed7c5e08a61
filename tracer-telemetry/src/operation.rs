//! Operation tracking: one correlated request record per unit of work.

use std::ops::Deref;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracer_primitives::{Measurements, OperationId};
use tracing::debug;

use crate::tracer::Tracer;

/// Identity of an open operation, stamped onto every item emitted inside it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationContext {
    id: OperationId,
    name: String,
}

impl OperationContext {
    /// Creates a context.
    #[must_use]
    pub fn new(id: OperationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Correlation id.
    #[must_use]
    pub const fn id(&self) -> OperationId {
        self.id
    }

    /// Operation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Outcome of an operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OperationStatus {
    /// Completed normally; the default.
    #[default]
    Success,
    /// Explicitly marked as failed.
    Failure,
}

impl OperationStatus {
    /// Response code recorded on the request item.
    #[must_use]
    pub const fn response_code(self) -> &'static str {
        match self {
            Self::Success => "200",
            Self::Failure => "500",
        }
    }

    /// Returns `true` for [`OperationStatus::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// State accumulated while an operation is open.
#[derive(Clone, Debug)]
pub struct OperationRecord {
    context: OperationContext,
    started_at: DateTime<Utc>,
    started: Instant,
    status: OperationStatus,
    measurements: Measurements,
}

impl OperationRecord {
    fn open(name: String) -> Self {
        Self {
            context: OperationContext::new(OperationId::random(), name),
            started_at: Utc::now(),
            started: Instant::now(),
            status: OperationStatus::Success,
            measurements: Measurements::new(),
        }
    }

    /// Identity of the operation.
    #[must_use]
    pub fn context(&self) -> &OperationContext {
        &self.context
    }

    /// Wall-clock start.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Time since the operation was started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> OperationStatus {
        self.status
    }

    /// Measurements recorded so far.
    #[must_use]
    pub fn measurements(&self) -> &Measurements {
        &self.measurements
    }
}

/// Tracers able to host operations.
///
/// Implementors receive the start and completion callbacks; callers go
/// through [`start_operation`](Self::start_operation) and the returned
/// [`Operation`] guard.
pub trait OperationHandler: Tracer {
    /// Called when an operation opens; items emitted until completion should
    /// carry `context`.
    fn begin_operation(&mut self, context: &OperationContext);

    /// Called exactly once when the operation is dispatched; emits the summary
    /// record and clears the operation context.
    fn complete_operation(&mut self, record: &OperationRecord);

    /// Opens an operation named `name`.
    ///
    /// The guard mutably borrows the tracer, so operations cannot overlap on
    /// one tracer, and it dispatches on drop if [`Operation::dispatch`] was
    /// not called.
    fn start_operation(&mut self, name: impl Into<String>) -> Operation<'_, Self>
    where
        Self: Sized,
    {
        let record = OperationRecord::open(name.into());
        debug!(
            operation_id = %record.context.id(),
            operation = record.context.name(),
            "operation started"
        );
        self.begin_operation(&record.context);
        Operation {
            tracer: self,
            record,
        }
    }
}

/// Scoped handle over an open operation.
///
/// Dereferences to the tracer, so traces issued through the guard are
/// correlated with the operation. Only shared access is lent out, so no
/// second operation can be started on the tracer until this one is
/// dispatched.
///
/// # Examples
///
/// ```
/// use tracer_config::BackendSettings;
/// use tracer_telemetry::{AITracer, OperationHandler, TelemetryConfiguration, Tracer};
///
/// let mut tracer = AITracer::new(TelemetryConfiguration::from_settings(BackendSettings::default()));
/// let mut operation = tracer.start_operation("import");
/// operation.trace_information("started");
/// operation.add_custom_measurement("rows", 42.0);
/// operation.dispatch();
/// tracer.start_operation("next").dispatch();
/// ```
///
/// Nesting is rejected at compile time:
///
/// ```compile_fail
/// use tracer_config::BackendSettings;
/// use tracer_telemetry::{AITracer, OperationHandler, TelemetryConfiguration, Tracer};
///
/// let mut tracer = AITracer::new(TelemetryConfiguration::from_settings(BackendSettings::default()));
/// let mut outer = tracer.start_operation("outer");
/// outer.start_operation("inner").dispatch();
/// outer.trace_information("after inner");
/// ```
#[must_use = "dropping the operation immediately dispatches it"]
pub struct Operation<'a, T>
where
    T: OperationHandler,
{
    tracer: &'a mut T,
    record: OperationRecord,
}

impl<T> Operation<'_, T>
where
    T: OperationHandler,
{
    /// Marks the operation as failed. Repeated calls have no further effect.
    pub fn mark_as_failure(&mut self) {
        self.record.status = OperationStatus::Failure;
    }

    /// Records a measurement, replacing any earlier value under `key`.
    pub fn add_custom_measurement(&mut self, key: impl Into<String>, value: f64) {
        self.record.measurements.insert(key, value);
    }

    /// Correlation id of the operation.
    #[must_use]
    pub fn id(&self) -> OperationId {
        self.record.context.id()
    }

    /// Name of the operation.
    #[must_use]
    pub fn name(&self) -> &str {
        self.record.context.name()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> OperationStatus {
        self.record.status
    }

    /// Seals the operation and emits its summary record.
    pub fn dispatch(self) {
        drop(self);
    }
}

impl<T> Deref for Operation<'_, T>
where
    T: OperationHandler,
{
    type Target = T;

    fn deref(&self) -> &T {
        &*self.tracer
    }
}

impl<T> Drop for Operation<'_, T>
where
    T: OperationHandler,
{
    fn drop(&mut self) {
        debug!(
            operation_id = %self.record.context.id(),
            operation = self.record.context.name(),
            status = ?self.record.status,
            "operation dispatched"
        );
        self.tracer.complete_operation(&self.record);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        traces: Mutex<Vec<(Option<OperationId>, String)>>,
        current: Option<OperationContext>,
        begun: usize,
        completed: Vec<(OperationContext, OperationStatus, Measurements)>,
    }

    impl Tracer for Recorder {
        fn trace_information(&self, message: &str) {
            let id = self.current.as_ref().map(OperationContext::id);
            self.traces.lock().unwrap().push((id, message.to_owned()));
        }

        fn trace_error(&self, message: &str) {
            self.trace_information(message);
        }

        fn trace_warning(&self, message: &str) {
            self.trace_information(message);
        }

        fn trace_verbose(&self, message: &str) {
            self.trace_information(message);
        }

        fn flush(&self) {}
    }

    impl OperationHandler for Recorder {
        fn begin_operation(&mut self, context: &OperationContext) {
            self.begun += 1;
            self.current = Some(context.clone());
        }

        fn complete_operation(&mut self, record: &OperationRecord) {
            self.current = None;
            self.completed.push((
                record.context().clone(),
                record.status(),
                record.measurements().clone(),
            ));
        }
    }

    #[test]
    fn dispatch_emits_exactly_once() {
        let mut recorder = Recorder::default();
        let operation = recorder.start_operation("import");
        operation.dispatch();

        assert_eq!(recorder.begun, 1);
        assert_eq!(recorder.completed.len(), 1);
        assert_eq!(recorder.completed[0].1, OperationStatus::Success);
    }

    #[test]
    fn failure_and_measurements_reach_the_record() {
        let mut recorder = Recorder::default();
        let mut operation = recorder.start_operation("import");
        operation.add_custom_measurement("m1", 1.0);
        operation.add_custom_measurement("m2", 2.0);
        operation.mark_as_failure();
        operation.mark_as_failure();
        assert_eq!(operation.status(), OperationStatus::Failure);
        operation.dispatch();

        let (context, status, measurements) = &recorder.completed[0];
        assert_eq!(context.name(), "import");
        assert_eq!(*status, OperationStatus::Failure);
        assert_eq!(status.response_code(), "500");
        assert_eq!(measurements.get("m1"), Some(1.0));
        assert_eq!(measurements.get("m2"), Some(2.0));
    }

    #[test]
    fn duplicate_measurement_overwrites() {
        let mut recorder = Recorder::default();
        let mut operation = recorder.start_operation("import");
        operation.add_custom_measurement("m1", 1.0);
        operation.add_custom_measurement("m1", 2.0);
        drop(operation);

        assert_eq!(recorder.completed[0].2.get("m1"), Some(2.0));
        assert_eq!(recorder.completed[0].2.len(), 1);
    }

    #[test]
    fn traces_through_the_guard_are_correlated() {
        let mut recorder = Recorder::default();
        let operation = recorder.start_operation("import");
        let id = operation.id();
        operation.trace_information("inside");
        operation.dispatch();
        recorder.trace_information("outside");

        let traces = recorder.traces.into_inner().unwrap();
        assert_eq!(traces[0], (Some(id), "inside".to_owned()));
        assert_eq!(traces[1], (None, "outside".to_owned()));
    }

    #[test]
    fn dispatches_when_unwinding() {
        let mut recorder = Recorder::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _operation = recorder.start_operation("doomed");
            panic!("job blew up");
        }));
        assert!(result.is_err());
        assert_eq!(recorder.completed.len(), 1);
    }

    #[test]
    fn each_operation_gets_a_fresh_id_and_measurements() {
        let mut recorder = Recorder::default();
        let mut first = recorder.start_operation("first");
        first.add_custom_measurement("rows", 10.0);
        first.dispatch();
        recorder.start_operation("second").dispatch();

        assert_ne!(recorder.completed[0].0.id(), recorder.completed[1].0.id());
        assert!(recorder.completed[1].2.is_empty());
    }
}
