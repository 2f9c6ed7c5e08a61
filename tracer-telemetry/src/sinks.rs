//! Host-side tracer sinks.
//!
//! These are the usual additional sinks of an [`AggregatedTracer`]: the host
//! log, surfaced through `tracing`, and plain text writers such as a console
//! or a log file.
//!
//! [`AggregatedTracer`]: crate::AggregatedTracer

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use crate::tracer::Tracer;

/// Sink forwarding traces to `tracing` events tagged with a logger name.
#[derive(Clone, Debug)]
pub struct LogTracer {
    name: String,
}

impl LogTracer {
    /// Creates a sink whose events carry `logger = name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Logger name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Tracer for LogTracer {
    fn trace_information(&self, message: &str) {
        info!(logger = %self.name, "{message}");
    }

    fn trace_error(&self, message: &str) {
        error!(logger = %self.name, "{message}");
    }

    fn trace_warning(&self, message: &str) {
        warn!(logger = %self.name, "{message}");
    }

    fn trace_verbose(&self, message: &str) {
        debug!(logger = %self.name, "{message}");
    }

    fn flush(&self) {}
}

/// Sink writing one prefixed line per trace.
///
/// Errors, warnings and verbose messages are prefixed with `Error: `,
/// `Warning: ` and `Verbose: `; information is written as is.
pub struct WriterTracer<W> {
    writer: Mutex<W>,
}

impl<W> WriterTracer<W>
where
    W: Write + Send,
{
    /// Wraps `writer`.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_line(&self, prefix: &str, message: &str) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(writer, "{prefix}{message}") {
            warn!(error = %err, "failed to write trace line");
        }
    }
}

impl WriterTracer<std::io::Stdout> {
    /// Sink writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W> Tracer for WriterTracer<W>
where
    W: Write + Send,
{
    fn trace_information(&self, message: &str) {
        self.write_line("", message);
    }

    fn trace_error(&self, message: &str) {
        self.write_line("Error: ", message);
    }

    fn trace_warning(&self, message: &str) {
        self.write_line("Warning: ", message);
    }

    fn trace_verbose(&self, message: &str) {
        self.write_line("Verbose: ", message);
    }

    fn flush(&self) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writer.flush() {
            warn!(error = %err, "failed to flush trace writer");
        }
    }
}

impl<W> std::fmt::Debug for WriterTracer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterTracer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::exception::ExceptionDetails;

    #[test]
    fn writer_prefixes_by_severity() {
        let sink = WriterTracer::new(Vec::new());
        sink.trace_information("started");
        sink.trace_warning("slow");
        sink.trace_error("failed");
        sink.trace_verbose("details");
        sink.flush();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "started\nWarning: slow\nError: failed\nVerbose: details\n"
        );
    }

    #[test]
    fn writer_renders_exceptions_and_metrics_through_defaults() {
        let sink = WriterTracer::new(Vec::new());
        sink.report_exception(&ExceptionDetails::new("Timeout", "gave up").with_cause("dns"));
        sink.report_metric("queue_depth", 12.5, None);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with("Error: Timeout: gave up\n ---> caused by: dns\n"));
        assert!(output.ends_with("Verbose: Metric queue_depth: 12.5\n"));
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("pipe closed"))
        }
    }

    #[test]
    fn writer_failures_are_swallowed() {
        let sink = WriterTracer::new(Broken);
        sink.trace_error("lost");
        sink.flush();
    }

    #[test]
    fn log_tracer_keeps_its_name() {
        let sink = LogTracer::new("Host.Function");
        assert_eq!(sink.name(), "Host.Function");
        sink.trace_information("no subscriber installed");
        sink.flush();
    }
}
