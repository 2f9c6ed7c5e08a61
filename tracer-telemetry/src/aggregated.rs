//! Fan-out over a primary tracer and additional sinks.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracer_primitives::{CustomProperties, SeverityLevel};
use tracing::error;

use crate::ai_tracer::AITracer;
use crate::configuration::TelemetryConfiguration;
use crate::exception::ExceptionDetails;
use crate::operation::{OperationContext, OperationHandler, OperationRecord};
use crate::tracer::{DependencyCall, TelemetryReporter, Tracer};

/// Forwards every tracer call to a primary sink, then to each additional
/// sink in order.
///
/// The additional sinks are copied at construction and never change. A sink
/// that panics is logged and skipped; the remaining sinks still receive the
/// call. Custom properties, request and dependency tracking, and operations
/// only touch the primary.
pub struct AggregatedTracer<P = AITracer> {
    primary: P,
    additional: Arc<[Arc<dyn Tracer>]>,
}

impl AggregatedTracer<AITracer> {
    /// Builds a fresh [`AITracer`] bound to `configuration` and aggregates it
    /// with `additional`.
    #[must_use]
    pub fn from_configuration<I>(configuration: TelemetryConfiguration, additional: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Tracer>>,
    {
        Self::new(AITracer::new(configuration), additional)
    }
}

impl<P> AggregatedTracer<P>
where
    P: Tracer,
{
    /// Aggregates an existing primary with `additional`.
    #[must_use]
    pub fn new<I>(primary: P, additional: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Tracer>>,
    {
        Self {
            primary,
            additional: additional.into_iter().collect(),
        }
    }

    /// The primary sink.
    #[must_use]
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// Mutable access to the primary sink.
    pub fn primary_mut(&mut self) -> &mut P {
        &mut self.primary
    }

    /// The additional sinks, in fan-out order.
    #[must_use]
    pub fn additional(&self) -> &[Arc<dyn Tracer>] {
        &self.additional
    }

    /// Unwraps the primary sink.
    pub fn into_primary(self) -> P {
        self.primary
    }

    fn fan_out(&self, call: &'static str, deliver: impl Fn(&dyn Tracer)) {
        deliver_isolated(call, "primary", &self.primary, &deliver);
        for sink in self.additional.iter() {
            deliver_isolated(call, "additional", sink.as_ref(), &deliver);
        }
    }
}

fn deliver_isolated(
    call: &'static str,
    role: &'static str,
    sink: &dyn Tracer,
    deliver: &dyn Fn(&dyn Tracer),
) {
    if panic::catch_unwind(AssertUnwindSafe(|| deliver(sink))).is_err() {
        error!(call, role, "tracer sink panicked; continuing with remaining sinks");
    }
}

impl<P> Tracer for AggregatedTracer<P>
where
    P: Tracer,
{
    fn trace_information(&self, message: &str) {
        self.fan_out("trace_information", |sink| sink.trace_information(message));
    }

    fn trace_error(&self, message: &str) {
        self.fan_out("trace_error", |sink| sink.trace_error(message));
    }

    fn trace_warning(&self, message: &str) {
        self.fan_out("trace_warning", |sink| sink.trace_warning(message));
    }

    fn trace_verbose(&self, message: &str) {
        self.fan_out("trace_verbose", |sink| sink.trace_verbose(message));
    }

    fn report_exception(&self, exception: &ExceptionDetails) {
        self.fan_out("report_exception", |sink| sink.report_exception(exception));
    }

    fn report_metric(&self, name: &str, value: f64, properties: Option<&CustomProperties>) {
        self.fan_out("report_metric", |sink| {
            sink.report_metric(name, value, properties);
        });
    }

    fn flush(&self) {
        self.fan_out("flush", |sink| sink.flush());
    }

    fn trace(&self, severity: SeverityLevel, message: &str) {
        self.fan_out("trace", |sink| sink.trace(severity, message));
    }
}

impl<P> TelemetryReporter for AggregatedTracer<P>
where
    P: TelemetryReporter,
{
    fn add_custom_property(&mut self, key: &str, value: &str) {
        self.primary.add_custom_property(key, value);
    }

    fn track_request(&self, name: &str, elapsed: Duration) {
        self.primary.track_request(name, elapsed);
    }

    fn track_dependency(&self, call: DependencyCall) {
        self.primary.track_dependency(call);
    }
}

impl<P> OperationHandler for AggregatedTracer<P>
where
    P: OperationHandler,
{
    fn begin_operation(&mut self, context: &OperationContext) {
        self.primary.begin_operation(context);
    }

    fn complete_operation(&mut self, record: &OperationRecord) {
        self.primary.complete_operation(record);
    }
}

impl<P> std::fmt::Debug for AggregatedTracer<P>
where
    P: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregatedTracer")
            .field("primary", &self.primary)
            .field("additional", &self.additional.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::channel::InMemoryChannel;
    use crate::envelope::TelemetryItem;

    #[derive(Default)]
    struct Counting {
        calls: Mutex<Vec<(&'static str, String)>>,
        flushes: AtomicUsize,
    }

    impl Counting {
        fn record(&self, call: &'static str, message: &str) {
            self.calls.lock().unwrap().push((call, message.to_owned()));
        }

        fn calls(&self) -> Vec<(&'static str, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Tracer for Counting {
        fn trace_information(&self, message: &str) {
            self.record("information", message);
        }

        fn trace_error(&self, message: &str) {
            self.record("error", message);
        }

        fn trace_warning(&self, message: &str) {
            self.record("warning", message);
        }

        fn trace_verbose(&self, message: &str) {
            self.record("verbose", message);
        }

        fn flush(&self) {
            self.flushes.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Exploding;

    impl Tracer for Exploding {
        fn trace_information(&self, _message: &str) {
            panic!("sink down");
        }

        fn trace_error(&self, _message: &str) {
            panic!("sink down");
        }

        fn trace_warning(&self, _message: &str) {
            panic!("sink down");
        }

        fn trace_verbose(&self, _message: &str) {
            panic!("sink down");
        }

        fn flush(&self) {
            panic!("flush failed");
        }
    }

    fn sinks(count: usize) -> Vec<Arc<Counting>> {
        (0..count).map(|_| Arc::new(Counting::default())).collect()
    }

    fn as_dyn(sinks: &[Arc<Counting>]) -> Vec<Arc<dyn Tracer>> {
        sinks
            .iter()
            .map(|sink| Arc::clone(sink) as Arc<dyn Tracer>)
            .collect()
    }

    #[test]
    fn every_sink_receives_each_call_once() {
        let primary = Arc::new(Counting::default());
        let extra = sinks(3);
        let aggregate = AggregatedTracer::new(Arc::clone(&primary), as_dyn(&extra));

        aggregate.trace_information("i");
        aggregate.trace_warning("w");
        aggregate.trace_error("e");
        aggregate.trace_verbose("v");

        let expected = vec![
            ("information", "i".to_owned()),
            ("warning", "w".to_owned()),
            ("error", "e".to_owned()),
            ("verbose", "v".to_owned()),
        ];
        assert_eq!(primary.calls(), expected);
        for sink in &extra {
            assert_eq!(sink.calls(), expected);
        }
    }

    #[test]
    fn duplicate_sinks_are_called_per_entry() {
        let sink = Arc::new(Counting::default());
        let shared: Arc<dyn Tracer> = sink.clone();
        let aggregate =
            AggregatedTracer::new(Counting::default(), vec![shared.clone(), shared]);
        aggregate.trace_information("twice");
        assert_eq!(sink.calls().len(), 2);
    }

    #[test]
    fn flush_reaches_all_sinks_when_primary_panics() {
        let extra = sinks(2);
        let aggregate = AggregatedTracer::new(Exploding, as_dyn(&extra));

        aggregate.flush();
        aggregate.trace_information("still delivered");

        for sink in &extra {
            assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
            assert_eq!(sink.calls(), [("information", "still delivered".to_owned())]);
        }
    }

    #[test]
    fn panicking_additional_sink_does_not_block_later_ones() {
        let primary = Arc::new(Counting::default());
        let last = Arc::new(Counting::default());
        let aggregate = AggregatedTracer::new(
            Arc::clone(&primary),
            vec![Arc::new(Exploding) as Arc<dyn Tracer>, last.clone()],
        );

        aggregate.trace_error("boom");
        assert_eq!(primary.calls().len(), 1);
        assert_eq!(last.calls().len(), 1);
    }

    #[test]
    fn later_changes_to_the_source_list_are_ignored() {
        let first = Arc::new(Counting::default());
        let mut source: Vec<Arc<dyn Tracer>> = vec![first.clone()];
        let aggregate = AggregatedTracer::new(Counting::default(), source.clone());
        let late = Arc::new(Counting::default());
        source.push(late.clone());

        aggregate.trace_information("hello");
        assert_eq!(aggregate.additional().len(), 1);
        assert_eq!(first.calls().len(), 1);
        assert!(late.calls().is_empty());
    }

    #[test]
    fn exceptions_fan_out_with_structured_record_on_primary_only() {
        let channel = Arc::new(InMemoryChannel::new());
        let configuration = TelemetryConfiguration::from_instrumentation_key("ikey")
            .unwrap()
            .with_channel(channel.clone());
        let host = Arc::new(Counting::default());
        let aggregate = AggregatedTracer::from_configuration(configuration, as_dyn(&[host.clone()]));

        aggregate.report_exception(&ExceptionDetails::new("Timeout", "too slow"));
        aggregate.flush();

        let delivered = channel.delivered();
        assert_eq!(delivered.len(), 2);
        assert!(matches!(delivered[1].data, TelemetryItem::Exception(_)));
        let host_calls = host.calls();
        assert_eq!(host_calls.len(), 1);
        assert_eq!(host_calls[0].0, "error");
        assert!(host_calls[0].1.contains("too slow"));
    }

    #[test]
    fn properties_and_operations_stay_on_the_primary() {
        let channel = Arc::new(InMemoryChannel::new());
        let configuration = TelemetryConfiguration::from_instrumentation_key("ikey")
            .unwrap()
            .with_channel(channel.clone());
        let host = Arc::new(Counting::default());
        let mut aggregate =
            AggregatedTracer::from_configuration(configuration, as_dyn(&[host.clone()]));

        aggregate.add_custom_property("env", "test");
        let mut operation = aggregate.start_operation("job");
        operation.trace_information("working");
        operation.add_custom_measurement("rows", 3.0);
        operation.dispatch();
        aggregate.flush();

        assert_eq!(aggregate.primary().custom_properties().get("env"), Some("test"));
        assert_eq!(host.calls(), [("information", "working".to_owned())]);
        let delivered = channel.delivered();
        assert_eq!(delivered.len(), 2);
        let TelemetryItem::Request(request) = &delivered[1].data else {
            panic!("expected request");
        };
        assert_eq!(request.properties.get("env"), Some("test"));
        assert_eq!(request.measurements.get("rows"), Some(3.0));
    }

    #[test]
    fn wrapping_and_building_are_equivalent() {
        let channel = Arc::new(InMemoryChannel::new());
        let configuration = TelemetryConfiguration::from_instrumentation_key("ikey")
            .unwrap()
            .with_channel(channel.clone());

        let built = AggregatedTracer::from_configuration(configuration.clone(), Vec::new());
        let wrapped = AggregatedTracer::new(AITracer::new(configuration), Vec::new());
        built.trace_information("same");
        wrapped.trace_information("same");
        built.flush();

        let delivered = channel.delivered();
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].data, delivered[1].data);
        assert_eq!(
            delivered[0].instrumentation_key,
            delivered[1].instrumentation_key
        );
    }
}
