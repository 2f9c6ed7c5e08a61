//! Telemetry tracer for scheduled and triggered job invocations.
//!
//! This crate bundles the tracer crates behind feature flags. The tracer
//! capability, operations, and fan-out aggregation are always available;
//! settings resolution and host bindings can be disabled for embedders that
//! build their own configuration.
//!
//! ```
//! use webjobs_aitracer::{AggregatedTracer, OperationHandler, TelemetryConfiguration, Tracer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let configuration = TelemetryConfiguration::from_instrumentation_key("my-key")?;
//! let mut tracer = AggregatedTracer::from_configuration(configuration, Vec::new());
//!
//! let mut operation = tracer.start_operation("nightly-import");
//! operation.trace_information("import started");
//! operation.add_custom_measurement("rows", 1200.0);
//! operation.dispatch();
//! tracer.flush();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

/// Shared identifiers, keys, and property bags.
pub use tracer_primitives as primitives;

/// Tracer capability and telemetry plumbing.
pub use tracer_telemetry as telemetry;

/// Backend settings (enabled by `config` feature).
#[cfg(feature = "config")]
pub use tracer_config as config;

/// Host bindings (enabled by `bindings` feature).
#[cfg(feature = "bindings")]
pub use tracer_bindings as bindings;

pub use tracer_telemetry::{
    AITracer, AggregatedTracer, ExceptionDetails, Operation, OperationHandler, TelemetryConfiguration,
    TelemetryReporter, Tracer, TracerExt,
};
