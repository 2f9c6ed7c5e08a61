//! Telemetry client: context stamping and best-effort delivery.

use std::collections::BTreeMap;

use chrono::Utc;
use tracer_primitives::SessionId;
use tracing::{trace, warn};

use crate::configuration::TelemetryConfiguration;
use crate::envelope::{
    Envelope, OPERATION_ID_TAG, OPERATION_NAME_TAG, SESSION_ID_TAG, TelemetryItem,
};
use crate::operation::OperationContext;

/// Sends items through the configured channel.
///
/// Nothing here returns an error: delivery failures are logged and dropped so
/// telemetry can never fail the work it describes.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    configuration: TelemetryConfiguration,
    session_id: SessionId,
    operation: Option<OperationContext>,
}

impl TelemetryClient {
    /// Creates a client for the given configuration and session.
    #[must_use]
    pub fn new(configuration: TelemetryConfiguration, session_id: SessionId) -> Self {
        Self {
            configuration,
            session_id,
            operation: None,
        }
    }

    /// Configuration the client was built from.
    #[must_use]
    pub fn configuration(&self) -> &TelemetryConfiguration {
        &self.configuration
    }

    /// Session stamped onto every envelope.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Operation currently stamped onto envelopes, if any.
    #[must_use]
    pub fn operation(&self) -> Option<&OperationContext> {
        self.operation.as_ref()
    }

    /// Sets or clears the operation context.
    pub fn set_operation(&mut self, operation: Option<OperationContext>) {
        self.operation = operation;
    }

    /// Wraps the item in an envelope and hands it to the channel.
    ///
    /// Items are dropped when telemetry is disabled or no instrumentation key
    /// is configured.
    pub fn track(&self, item: TelemetryItem) {
        let settings = self.configuration.settings();
        let Some(key) = settings.key().filter(|_| settings.is_enabled()) else {
            trace!(kind = item.kind(), "telemetry disabled; dropping item");
            return;
        };

        let mut tags = BTreeMap::new();
        tags.insert(SESSION_ID_TAG.to_owned(), self.session_id.to_string());
        if let Some(operation) = &self.operation {
            tags.insert(OPERATION_ID_TAG.to_owned(), operation.id().to_string());
            tags.insert(OPERATION_NAME_TAG.to_owned(), operation.name().to_owned());
        }

        let envelope = Envelope {
            name: item.kind().to_owned(),
            time: Utc::now(),
            instrumentation_key: key.clone(),
            tags,
            data: item,
        };

        if let Err(error) = self.configuration.channel().send(envelope) {
            warn!(%error, session_id = %self.session_id, "failed to send telemetry");
        }
    }

    /// Flushes the channel, blocking until it returns.
    pub fn flush(&self) {
        if let Err(error) = self.configuration.channel().flush() {
            warn!(%error, session_id = %self.session_id, "failed to flush telemetry");
        }
    }
}
