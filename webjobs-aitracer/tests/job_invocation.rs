use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use webjobs_aitracer::bindings::{
    Binding, BindingContext, BindingProvider, ParameterDescriptor, TracerConfigurationOverride,
    TracerExtension,
};
use webjobs_aitracer::primitives::{InvocationId, SeverityLevel};
use webjobs_aitracer::telemetry::sinks::WriterTracer;
use webjobs_aitracer::telemetry::{
    Envelope, InMemoryChannel, MESSAGE_TOO_LONG_TYPE, OPERATION_ID_TAG, OPERATION_NAME_TAG,
    SESSION_ID_TAG, TelemetryItem,
};
use webjobs_aitracer::{
    AggregatedTracer, ExceptionDetails, OperationHandler, TelemetryConfiguration, Tracer, TracerExt,
};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Error)]
#[error("Test Failure")]
struct TestFailure;

struct Harness {
    channel: Arc<InMemoryChannel>,
    host_output: SharedBuffer,
    extension: TracerExtension,
}

impl Harness {
    fn new() -> Self {
        let channel = Arc::new(InMemoryChannel::new());
        let configuration = TelemetryConfiguration::from_instrumentation_key("job-key")
            .unwrap()
            .with_channel(channel.clone());
        Self {
            channel,
            host_output: SharedBuffer::default(),
            extension: TracerExtension::new(configuration),
        }
    }

    async fn bind(&self, parameter: ParameterDescriptor, context: &BindingContext) -> AggregatedTracer {
        let host: Arc<dyn Tracer> = Arc::new(WriterTracer::new(self.host_output.clone()));
        let provider = self.extension.initialize(host);
        let binding = provider.try_create(&parameter).await.unwrap().unwrap();
        binding.bind(context).await.into_tracer()
    }
}

fn kinds(delivered: &[Envelope]) -> Vec<&'static str> {
    delivered
        .iter()
        .map(|envelope| match &envelope.data {
            TelemetryItem::Trace(_) => "trace",
            TelemetryItem::Exception(_) => "exception",
            TelemetryItem::Metric(_) => "metric",
            TelemetryItem::Request(_) => "request",
            TelemetryItem::Dependency(_) => "dependency",
        })
        .collect()
}

#[tokio::test]
async fn failing_job_reports_one_failed_operation() {
    let harness = Harness::new();
    let invocation_id = InvocationId::random();
    let context = BindingContext::with_invocation_id(invocation_id, "Functions.SampleJob");
    let mut tracer = harness
        .bind(ParameterDescriptor::tracer("tracer"), &context)
        .await;

    let mut operation = tracer.start_operation("Test Operation");
    let operation_id = operation.id();
    operation.trace_information("Function started!");
    let outcome: Result<(), TestFailure> = Err(TestFailure);
    if let Err(err) = outcome {
        operation.report_error(&err);
        operation.mark_as_failure();
    }
    operation.dispatch();
    tracer.flush();

    let delivered = harness.channel.delivered();
    assert_eq!(kinds(&delivered), ["trace", "trace", "exception", "request"]);
    for envelope in &delivered {
        assert_eq!(envelope.tag(SESSION_ID_TAG), Some(invocation_id.to_string().as_str()));
        assert_eq!(envelope.tag(OPERATION_ID_TAG), Some(operation_id.to_string().as_str()));
        assert_eq!(envelope.tag(OPERATION_NAME_TAG), Some("Test Operation"));
    }

    let TelemetryItem::Trace(error_trace) = &delivered[1].data else {
        panic!("expected error trace");
    };
    assert_eq!(error_trace.severity_level, SeverityLevel::Error);
    assert!(error_trace.message.contains("Test Failure"));

    let TelemetryItem::Request(request) = &delivered[3].data else {
        panic!("expected request");
    };
    assert_eq!(request.name, "Test Operation");
    assert_eq!(request.id, operation_id);
    assert!(!request.success);
    assert_eq!(request.response_code, "500");

    let host = harness.host_output.contents();
    assert!(host.starts_with("Function started!\nError: "));
    assert!(host.contains("Test Failure"));
}

#[tokio::test]
async fn traces_after_dispatch_are_uncorrelated() {
    let harness = Harness::new();
    let mut tracer = harness
        .bind(ParameterDescriptor::tracer("tracer"), &BindingContext::new("job"))
        .await;

    tracer.start_operation("first").dispatch();
    tracer.trace_information("between operations");
    tracer.flush();

    let delivered = harness.channel.delivered();
    assert_eq!(kinds(&delivered), ["request", "trace"]);
    let TelemetryItem::Request(request) = &delivered[0].data else {
        panic!("expected request");
    };
    assert!(request.success);
    assert_eq!(request.response_code, "200");
    assert_eq!(delivered[1].tag(OPERATION_ID_TAG), None);
}

#[tokio::test]
async fn oversized_exception_is_bounded_but_traced_in_full() {
    let harness = Harness::new();
    let tracer = harness
        .bind(ParameterDescriptor::tracer("tracer"), &BindingContext::new("job"))
        .await;

    let message = "q".repeat(5000);
    tracer.report_exception(&ExceptionDetails::new("PayloadError", message.clone()));
    tracer.flush();

    let delivered = harness.channel.delivered();
    assert_eq!(kinds(&delivered), ["trace", "exception"]);
    let TelemetryItem::Trace(trace) = &delivered[0].data else {
        panic!("expected trace");
    };
    assert!(trace.message.contains(&message));
    let TelemetryItem::Exception(exception) = &delivered[1].data else {
        panic!("expected exception");
    };
    assert_eq!(exception.type_name, MESSAGE_TOO_LONG_TYPE);
    assert!(exception.message.chars().count() <= 1024);
    assert!(exception.message.contains("PayloadError"));
    assert!(harness.host_output.contents().contains(&message));
}

#[tokio::test]
async fn anyhow_errors_keep_their_context() {
    let harness = Harness::new();
    let tracer = harness
        .bind(ParameterDescriptor::tracer("tracer"), &BindingContext::new("job"))
        .await;

    let error = anyhow::anyhow!("connection refused").context("loading batch 7");
    tracer.report_exception(&ExceptionDetails::from_anyhow(&error));
    tracer.flush();

    let delivered = harness.channel.delivered();
    let TelemetryItem::Exception(exception) = &delivered[1].data else {
        panic!("expected exception");
    };
    assert_eq!(exception.message, "loading batch 7");
    assert_eq!(exception.causes, ["connection refused"]);
}

#[tokio::test]
async fn parameter_override_redirects_telemetry() {
    let harness = Harness::new();
    let override_channel = Arc::new(InMemoryChannel::new());
    let override_configuration = TelemetryConfiguration::from_instrumentation_key("other-key")
        .unwrap()
        .with_channel(override_channel.clone());
    let parameter = ParameterDescriptor::tracer("tracer")
        .with_override(TracerConfigurationOverride::from_configuration(override_configuration));

    let tracer = harness.bind(parameter, &BindingContext::new("job")).await;
    tracer.trace_information("Function started!");
    tracer.flush();

    assert!(harness.channel.delivered().is_empty());
    let delivered = override_channel.delivered();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].instrumentation_key.as_str(), "other-key");
}

#[tokio::test]
async fn disabled_configuration_still_reaches_host_logger() {
    let harness = Harness::new();
    let disabled_channel = Arc::new(InMemoryChannel::new());
    let settings = webjobs_aitracer::config::BackendSettings::default();
    let configuration =
        TelemetryConfiguration::new(settings, disabled_channel.clone());
    let parameter = ParameterDescriptor::tracer("tracer")
        .with_override(TracerConfigurationOverride::from_configuration(configuration));

    let tracer = harness.bind(parameter, &BindingContext::new("job")).await;
    tracer.trace_warning("no key configured");
    tracer.flush();

    assert!(disabled_channel.delivered().is_empty());
    assert_eq!(harness.host_output.contents(), "Warning: no key configured\n");
}
