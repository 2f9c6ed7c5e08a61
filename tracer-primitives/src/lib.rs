//! Core shared types for the job tracer: identifiers, severity levels, property
//! sets, and the instrumentation key.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod key;
mod properties;
mod severity;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Correlation identifiers for sessions, operations, and invocations.
pub use ids::{InvocationId, OperationId, SessionId};
/// Validated backend instrumentation key.
pub use key::InstrumentationKey;
/// Tracer-scoped properties and operation-scoped measurements.
pub use properties::{CustomProperties, Measurements};
/// Severity attached to trace records.
pub use severity::SeverityLevel;
