//! Backend configuration handed to telemetry clients.

use std::fmt;
use std::sync::Arc;

use tracer_config::{BackendSettings, ConfigError, ConfigResult};
use tracer_primitives::InstrumentationKey;

use crate::channel::{LogChannel, TelemetryChannel};

/// Settings plus the channel telemetry is delivered through.
///
/// Cloning is cheap and clones share the channel, so every tracer built from
/// one configuration buffers into the same place.
#[derive(Clone)]
pub struct TelemetryConfiguration {
    settings: BackendSettings,
    channel: Arc<dyn TelemetryChannel>,
}

impl TelemetryConfiguration {
    /// Creates a configuration from explicit settings and channel.
    #[must_use]
    pub fn new(settings: BackendSettings, channel: Arc<dyn TelemetryChannel>) -> Self {
        Self { settings, channel }
    }

    /// Creates a configuration that delivers through a fresh [`LogChannel`]
    /// addressed to the settings' endpoint.
    #[must_use]
    pub fn from_settings(settings: BackendSettings) -> Self {
        let channel = Arc::new(LogChannel::new(settings.endpoint_url()));
        Self::new(settings, channel)
    }

    /// Resolves the ambient default configuration from the environment.
    ///
    /// # Errors
    ///
    /// Propagates [`ConfigError`] from [`BackendSettings::from_env`].
    pub fn from_env() -> ConfigResult<Self> {
        BackendSettings::from_env().map(Self::from_settings)
    }

    /// Default configuration bound to the supplied instrumentation key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the key is not usable.
    pub fn from_instrumentation_key(key: &str) -> ConfigResult<Self> {
        let key = InstrumentationKey::new(key).map_err(|source| ConfigError::InvalidValue {
            name: "instrumentation_key",
            source,
        })?;
        Ok(Self::from_settings(BackendSettings::with_instrumentation_key(
            key,
        )))
    }

    /// Replaces the channel, keeping the settings.
    #[must_use]
    pub fn with_channel(mut self, channel: Arc<dyn TelemetryChannel>) -> Self {
        self.channel = channel;
        self
    }

    /// Replaces the settings, keeping the channel and the endpoint it was
    /// built for.
    #[must_use]
    pub fn with_settings(mut self, settings: BackendSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Backend settings.
    #[must_use]
    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Configured instrumentation key, if any.
    #[must_use]
    pub fn instrumentation_key(&self) -> Option<&InstrumentationKey> {
        self.settings.key()
    }

    /// Delivery channel.
    #[must_use]
    pub fn channel(&self) -> &Arc<dyn TelemetryChannel> {
        &self.channel
    }
}

impl fmt::Debug for TelemetryConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryConfiguration")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
