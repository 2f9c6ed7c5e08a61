//! Per-invocation tracer binding for job hosts.
//!
//! A host registers a [`TracerExtension`] once, hands its own logger to
//! [`TracerExtension::initialize`], and asks the resulting
//! [`TracerBindingProvider`] about every job parameter. Tracer parameters get
//! a [`TracerBinding`] that builds a fresh aggregated tracer per invocation,
//! correlated by the invocation id.

#![warn(missing_docs, clippy::pedantic)]

mod binding;
mod error;
mod extension;
mod overrides;
mod parameter;
mod provider;

pub use binding::{Binding, TRACER_PARAMETER_DESCRIPTION, TracerBinding, TracerValueProvider};
pub use error::{BindingError, BindingResult};
pub use extension::TracerExtension;
pub use overrides::{TracerConfigurationOverride, resolve_configuration};
pub use parameter::{BindingContext, ParameterDescriptor, ParameterKind};
pub use provider::{BindingProvider, TracerBindingProvider};
