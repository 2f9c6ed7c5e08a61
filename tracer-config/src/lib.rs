//! Configuration management for the job tracer.
//!
//! Settings are plain values threaded through constructors. The ambient default
//! is resolved once from the process environment by [`BackendSettings::from_env`];
//! nothing here keeps mutable global state.

#![warn(missing_docs, clippy::pedantic)]

mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ENDPOINT_VAR, INSTRUMENTATION_KEY_VAR};
pub use schema::{BackendSettings, DEFAULT_ENDPOINT};
