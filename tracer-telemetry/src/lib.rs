//! Tracer capability and telemetry plumbing for job invocations.
//!
//! The crate is layered bottom-up:
//!
//! - [`channel`] buffers and delivers serialized [`Envelope`]s.
//! - [`TelemetryClient`] stamps session and operation context onto items and
//!   swallows delivery failures.
//! - [`Tracer`] is the capability every sink implements; [`AITracer`] is the
//!   telemetry-backed sink, [`sinks`] holds the host-side ones.
//! - [`Operation`] groups one unit of work into a single request record.
//! - [`AggregatedTracer`] fans each call out to a primary sink and any
//!   number of additional sinks.

#![warn(missing_docs, clippy::pedantic)]

mod aggregated;
mod ai_tracer;
pub mod channel;
mod client;
mod configuration;
mod envelope;
mod exception;
mod operation;
pub mod sinks;
mod tracer;

pub use aggregated::AggregatedTracer;
pub use ai_tracer::{AITracer, AITracerBuilder};
pub use channel::{
    ChannelError, ChannelResult, InMemoryChannel, LogChannel, TelemetryChannel, WriterChannel,
};
pub use client::TelemetryClient;
pub use configuration::TelemetryConfiguration;
pub use envelope::{
    DependencyTelemetry, Envelope, ExceptionTelemetry, MetricTelemetry, OPERATION_ID_TAG,
    OPERATION_NAME_TAG, RequestTelemetry, SESSION_ID_TAG, TelemetryItem, TraceTelemetry,
};
pub use exception::{EXCEPTION_MESSAGE_MAX_LENGTH, ExceptionDetails, MESSAGE_TOO_LONG_TYPE};
pub use operation::{
    Operation, OperationContext, OperationHandler, OperationRecord, OperationStatus,
};
pub use tracer::{DependencyCall, TelemetryReporter, Tracer, TracerExt};
