//! Shared error definitions for tracer primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the tracer workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing tracer primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided identifier could not be parsed.
    #[error("invalid identifier: {source}")]
    InvalidId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// Instrumentation key failed validation.
    #[error("invalid instrumentation key `{key}`: {reason}")]
    InvalidInstrumentationKey {
        /// The offending key.
        key: String,
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Severity label could not be recognised.
    #[error("unknown severity level `{0}`")]
    UnknownSeverity(String),
}
