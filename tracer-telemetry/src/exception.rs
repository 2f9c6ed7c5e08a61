//! Exception capture and the message length policy.

use std::any::type_name;
use std::backtrace::BacktraceStatus;
use std::error::Error as StdError;
use std::fmt;

use tracer_primitives::CustomProperties;

use crate::envelope::ExceptionTelemetry;

/// Longest message a structured exception record may carry, in characters.
pub const EXCEPTION_MESSAGE_MAX_LENGTH: usize = 1024;

/// Type name recorded for the wrapper that replaces oversized exceptions.
pub const MESSAGE_TOO_LONG_TYPE: &str = "ExceptionMessageTooLong";

/// Captured error: type, message, cause chain and optional backtrace.
///
/// [`Display`](fmt::Display) renders the full representation used for the
/// error trace; [`to_telemetry`](Self::to_telemetry) produces the bounded
/// structured record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExceptionDetails {
    type_name: String,
    message: String,
    causes: Vec<String>,
    backtrace: Option<String>,
}

impl ExceptionDetails {
    /// Creates details from a type name and message.
    #[must_use]
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            causes: Vec::new(),
            backtrace: None,
        }
    }

    /// Appends a cause message.
    #[must_use]
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    /// Captures an error and walks its `source` chain.
    #[must_use]
    pub fn from_error<E>(error: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        let mut details = Self::new(type_name::<E>(), error.to_string());
        let mut source = error.source();
        while let Some(cause) = source {
            details.causes.push(cause.to_string());
            source = cause.source();
        }
        details
    }

    /// Captures an [`anyhow::Error`], including its backtrace when one was
    /// recorded.
    #[must_use]
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        let mut details = Self::new("anyhow::Error", error.to_string());
        details.causes = error.chain().skip(1).map(ToString::to_string).collect();
        let backtrace = error.backtrace();
        if backtrace.status() == BacktraceStatus::Captured {
            details.backtrace = Some(backtrace.to_string());
        }
        details
    }

    /// Name of the captured error type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Primary message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Cause messages, outermost first.
    #[must_use]
    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// Returns `true` when the message exceeds [`EXCEPTION_MESSAGE_MAX_LENGTH`].
    #[must_use]
    pub fn is_message_too_long(&self) -> bool {
        self.message.chars().count() > EXCEPTION_MESSAGE_MAX_LENGTH
    }

    /// Builds the structured record sent to the backend.
    ///
    /// Oversized messages are replaced by a [`MESSAGE_TOO_LONG_TYPE`] wrapper
    /// whose message names the original type and keeps as much of the trimmed
    /// original as fits in [`EXCEPTION_MESSAGE_MAX_LENGTH`]. The full text only
    /// ever reaches the error trace.
    #[must_use]
    pub fn to_telemetry(&self) -> ExceptionTelemetry {
        if !self.is_message_too_long() {
            return ExceptionTelemetry {
                type_name: self.type_name.clone(),
                message: self.message.clone(),
                causes: self.causes.clone(),
                properties: CustomProperties::new(),
            };
        }

        let prefix = format!(
            "Exception of type: {} could not be tracked because of a too long message. \
             The original stack trace can be found in traces.\nTrimmed message:\n",
            self.type_name
        );
        let budget = EXCEPTION_MESSAGE_MAX_LENGTH.saturating_sub(prefix.chars().count());
        let trimmed: String = self.message.trim().chars().take(budget).collect();

        let mut message: String = prefix.chars().take(EXCEPTION_MESSAGE_MAX_LENGTH).collect();
        message.push_str(&trimmed);

        ExceptionTelemetry {
            type_name: MESSAGE_TOO_LONG_TYPE.to_owned(),
            message,
            causes: Vec::new(),
            properties: CustomProperties::new(),
        }
    }
}

impl fmt::Display for ExceptionDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)?;
        for cause in &self.causes {
            write!(f, "\n ---> caused by: {cause}")?;
        }
        if let Some(backtrace) = &self.backtrace {
            write!(f, "\nstack backtrace:\n{backtrace}")?;
        }
        Ok(())
    }
}
